//! Engine configuration
//!
//! Names and lifetimes of the assignment cookie and the debug query
//! parameter. Defaults match what the browser bindings expect, so an engine
//! running on the server reads the same cookie the client writes.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default cookie holding the serialized assignment set.
pub const DEFAULT_COOKIE_NAME: &str = "ab_assignments";

/// Default query parameter carrying debug overrides.
pub const DEFAULT_OVERRIDE_PARAM: &str = "ab_override";

/// Variant returned when nothing else is resolvable.
pub const FALLBACK_VARIANT: &str = "A";

/// Outer cookie lifetime in days.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Cross-site policy for the assignment cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    /// Sent only on same-site requests
    Strict,
    /// Sent on same-site requests and top-level navigations (default)
    #[default]
    Lax,
    /// Sent everywhere; browsers require `Secure` alongside it
    None,
}

impl SameSite {
    /// Attribute value as it appears in a cookie string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Configuration for an [`AssignmentEngine`](crate::AssignmentEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    cookie_name: String,
    override_param: String,
    #[serde(with = "max_age_days")]
    max_age: Duration,
    path: String,
    same_site: SameSite,
    secure: bool,
    fallback_variant: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            override_param: DEFAULT_OVERRIDE_PARAM.to_string(),
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
            path: "/".to_string(),
            same_site: SameSite::Lax,
            secure: false,
            fallback_variant: FALLBACK_VARIANT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie name.
    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the debug override query parameter name.
    #[must_use]
    pub fn override_param(mut self, name: impl Into<String>) -> Self {
        self.override_param = name.into();
        self
    }

    /// Set the outer cookie lifetime.
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the cookie path scope.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the cross-site policy.
    #[must_use]
    pub const fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Mark the cookie `Secure`.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the variant returned for unknown experiments.
    #[must_use]
    pub fn fallback_variant(mut self, variant_id: impl Into<String>) -> Self {
        self.fallback_variant = variant_id.into();
        self
    }

    /// Get the cookie name.
    #[must_use]
    pub fn get_cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Get the override query parameter name.
    #[must_use]
    pub fn get_override_param(&self) -> &str {
        &self.override_param
    }

    /// Get the outer cookie lifetime.
    #[must_use]
    pub const fn get_max_age(&self) -> Duration {
        self.max_age
    }

    /// Get the cookie path scope.
    #[must_use]
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Get the cross-site policy.
    #[must_use]
    pub const fn get_same_site(&self) -> SameSite {
        self.same_site
    }

    /// Whether the cookie is marked `Secure`.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Get the fallback variant ID.
    #[must_use]
    pub fn get_fallback_variant(&self) -> &str {
        &self.fallback_variant
    }
}

mod max_age_days {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_days())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.get_cookie_name(), "ab_assignments");
        assert_eq!(config.get_override_param(), "ab_override");
        assert_eq!(config.get_max_age(), Duration::days(30));
        assert_eq!(config.get_path(), "/");
        assert_eq!(config.get_same_site(), SameSite::Lax);
        assert!(!config.is_secure());
        assert_eq!(config.get_fallback_variant(), "A");
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .cookie_name("exp")
            .override_param("force")
            .max_age(Duration::days(7))
            .same_site(SameSite::Strict)
            .secure(true);

        assert_eq!(config.get_cookie_name(), "exp");
        assert_eq!(config.get_override_param(), "force");
        assert_eq!(config.get_max_age().num_days(), 7);
        assert_eq!(config.get_same_site().as_str(), "Strict");
        assert!(config.is_secure());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"cookieName": "variants", "maxAge": 14}"#).unwrap();

        assert_eq!(config.get_cookie_name(), "variants");
        assert_eq!(config.get_max_age(), Duration::days(14));
        assert_eq!(config.get_override_param(), "ab_override");
    }
}
