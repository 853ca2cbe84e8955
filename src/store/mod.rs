//! Persistent Assignment Store
//!
//! All of a visitor's assignments live in one cookie-equivalent value. The
//! store owns the wire format ([`codec`]) and talks to whatever medium holds
//! that value through the [`StorageMedium`] capability:
//!
//! - [`MemoryMedium`] - in-process jar (tests, server-side caches)
//! - [`HeaderMedium`] - server context: `Cookie` in, `Set-Cookie` out
//! - [`NullMedium`] - no medium at all (non-interactive rendering)
//! - `DocumentMedium` - `document.cookie` (wasm32 + `wasm` feature)
//!
//! Every store operation is infallible. Missing, empty or malformed payloads
//! load as an empty [`AssignmentSet`].
//!
//! # Example
//!
//! ```rust
//! use trueno_ab::store::{Assignment, AssignmentSet, AssignmentStore, MemoryMedium};
//! use trueno_ab::EngineConfig;
//!
//! let store = AssignmentStore::new(MemoryMedium::new(), EngineConfig::default());
//! assert!(store.load().is_empty());
//!
//! let mut set = AssignmentSet::new();
//! set.insert("hero".into(), Assignment::new("hero", "B", 1_700_000_000_000));
//! store.save(&set);
//!
//! assert_eq!(store.load(), set);
//! store.clear();
//! assert!(store.load().is_empty());
//! ```

pub mod codec;
mod header;
mod memory;

pub use codec::variant_from_cookie;
pub use header::HeaderMedium;
pub use memory::MemoryMedium;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, SameSite};

/// A visitor's assignments keyed by experiment ID.
pub type AssignmentSet = BTreeMap<String, Assignment>;

/// Durable record that a visitor resolved to a variant of an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    experiment_id: String,
    variant_id: String,
    assigned_at: i64,
}

impl Assignment {
    /// Create an assignment stamped at `assigned_at` (epoch milliseconds).
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        assigned_at: i64,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            assigned_at,
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the assignment timestamp in epoch milliseconds.
    #[must_use]
    pub const fn assigned_at(&self) -> i64 {
        self.assigned_at
    }
}

/// Attributes written alongside the cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    expires: DateTime<Utc>,
    max_age_secs: i64,
    path: String,
    same_site: SameSite,
    secure: bool,
}

impl CookieAttributes {
    /// Attributes for a cookie that lives `config.max_age` from `now`.
    #[must_use]
    pub fn persistent(config: &EngineConfig, now: DateTime<Utc>) -> Self {
        let max_age = config.get_max_age();
        Self {
            expires: now + max_age,
            max_age_secs: max_age.num_seconds(),
            path: config.get_path().to_string(),
            same_site: config.get_same_site(),
            secure: config.is_secure(),
        }
    }

    /// Attributes that expire the cookie immediately.
    #[must_use]
    pub fn expired(config: &EngineConfig) -> Self {
        Self {
            expires: DateTime::<Utc>::default(),
            max_age_secs: 0,
            path: config.get_path().to_string(),
            same_site: config.get_same_site(),
            secure: config.is_secure(),
        }
    }

    /// Absolute expiry.
    #[must_use]
    pub const fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Relative expiry in seconds.
    #[must_use]
    pub const fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    /// Path scope.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Cross-site policy.
    #[must_use]
    pub const fn same_site(&self) -> SameSite {
        self.same_site
    }

    /// Whether these attributes delete the cookie.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.max_age_secs <= 0
    }

    /// Render as the attribute tail of a cookie string, e.g.
    /// `expires=Sat, 17 Nov 2026 10:00:00 GMT; max-age=2592000; path=/; SameSite=Lax`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "expires={}; max-age={}; path={}; SameSite={}",
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age_secs,
            self.path,
            self.same_site.as_str()
        );
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

/// Build a full `name=value; attributes` cookie string, as used for both
/// `Set-Cookie` headers and `document.cookie` assignment.
#[must_use]
pub fn set_cookie_header(name: &str, value: &str, attributes: &CookieAttributes) -> String {
    let mut header = String::with_capacity(name.len() + value.len() + 96);
    let _ = write!(header, "{name}={value}; {}", attributes.render());
    header
}

/// Extract the raw value of cookie `name` from a `Cookie` request header.
#[must_use]
pub fn cookie_from_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Capability over the medium holding the serialized assignment cookie.
pub trait StorageMedium {
    /// Read the raw value of cookie `name`.
    fn read(&self, name: &str) -> Option<String>;

    /// Write `value` under `name` with the given attributes.
    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes);

    /// Delete `name`; `attributes` carry an expiry in the past.
    fn remove(&self, name: &str, attributes: &CookieAttributes);

    /// Whether a real medium backs this handle.
    fn is_available(&self) -> bool {
        true
    }
}

impl<M: StorageMedium + ?Sized> StorageMedium for &M {
    fn read(&self, name: &str) -> Option<String> {
        (**self).read(name)
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        (**self).write(name, value, attributes);
    }

    fn remove(&self, name: &str, attributes: &CookieAttributes) {
        (**self).remove(name, attributes);
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<M: StorageMedium + ?Sized> StorageMedium for Rc<M> {
    fn read(&self, name: &str) -> Option<String> {
        (**self).read(name)
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        (**self).write(name, value, attributes);
    }

    fn remove(&self, name: &str, attributes: &CookieAttributes) {
        (**self).remove(name, attributes);
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Medium for contexts without cookie storage. Reads nothing, drops writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMedium;

impl StorageMedium for NullMedium {
    fn read(&self, _name: &str) -> Option<String> {
        None
    }

    fn write(&self, _name: &str, _value: &str, _attributes: &CookieAttributes) {}

    fn remove(&self, _name: &str, _attributes: &CookieAttributes) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// Reads and writes the whole [`AssignmentSet`] through a [`StorageMedium`].
pub struct AssignmentStore<M> {
    medium: M,
    config: EngineConfig,
    clock: Box<dyn Clock>,
}

impl<M: StorageMedium> AssignmentStore<M> {
    /// Create a store over `medium` using the system clock.
    #[must_use]
    pub fn new(medium: M, config: EngineConfig) -> Self {
        Self::with_clock(medium, config, SystemClock)
    }

    /// Create a store with an explicit clock.
    #[must_use]
    pub fn with_clock(medium: M, config: EngineConfig, clock: impl Clock + 'static) -> Self {
        Self {
            medium,
            config,
            clock: Box::new(clock),
        }
    }

    /// Load the visitor's assignments. Never fails.
    #[must_use]
    pub fn load(&self) -> AssignmentSet {
        self.raw()
            .and_then(|raw| codec::decode(&raw))
            .unwrap_or_default()
    }

    /// Raw serialized cookie value, if present.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        if !self.medium.is_available() {
            return None;
        }
        self.medium.read(self.config.get_cookie_name())
    }

    /// Persist the full set with a fresh outer expiry.
    pub fn save(&self, assignments: &AssignmentSet) {
        if !self.medium.is_available() {
            return;
        }
        match codec::encode(assignments) {
            Ok(value) => {
                let attributes = CookieAttributes::persistent(&self.config, self.clock.now());
                self.medium
                    .write(self.config.get_cookie_name(), &value, &attributes);
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode assignments, skipping write"),
        }
    }

    /// Expire the stored blob immediately.
    pub fn clear(&self) {
        if !self.medium.is_available() {
            return;
        }
        self.medium.remove(
            self.config.get_cookie_name(),
            &CookieAttributes::expired(&self.config),
        );
    }

    /// Current time from the store's clock, in epoch milliseconds.
    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// The underlying medium.
    #[must_use]
    pub const fn medium(&self) -> &M {
        &self.medium
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<M> std::fmt::Debug for AssignmentStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentStore")
            .field("cookie_name", &self.config.get_cookie_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn sample_set() -> AssignmentSet {
        let mut set = AssignmentSet::new();
        set.insert("exp-1".into(), Assignment::new("exp-1", "A", 1));
        set.insert("exp-2".into(), Assignment::new("exp-2", "B", 2));
        set
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = AssignmentStore::new(MemoryMedium::new(), EngineConfig::default());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = AssignmentStore::new(MemoryMedium::new(), EngineConfig::default());
        store.save(&sample_set());
        assert_eq!(store.load(), sample_set());
    }

    #[test]
    fn test_save_sets_thirty_day_expiry() {
        let medium = MemoryMedium::new();
        let clock = ManualClock::from_millis(1_700_000_000_000);
        let now = clock.now();
        let store = AssignmentStore::with_clock(&medium, EngineConfig::default(), clock);

        store.save(&sample_set());

        let attributes = medium.attributes("ab_assignments").unwrap();
        assert_eq!(attributes.expires(), now + chrono::Duration::days(30));
        assert_eq!(attributes.max_age_secs(), 30 * 24 * 60 * 60);
        assert_eq!(attributes.path(), "/");
        assert_eq!(attributes.same_site(), SameSite::Lax);
    }

    #[test]
    fn test_malformed_payload_loads_empty() {
        let medium = MemoryMedium::new();
        medium.insert_raw("ab_assignments", "%7Bnot-json");
        let store = AssignmentStore::new(&medium, EngineConfig::default());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_clear_expires_cookie() {
        let medium = MemoryMedium::new();
        let store = AssignmentStore::new(&medium, EngineConfig::default());
        store.save(&sample_set());
        store.clear();

        assert!(store.load().is_empty());
        assert!(medium.read("ab_assignments").is_none());
    }

    #[test]
    fn test_null_medium_is_noop() {
        let store = AssignmentStore::new(NullMedium, EngineConfig::default());
        store.save(&sample_set());
        store.clear();
        assert!(store.load().is_empty());
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_custom_cookie_name() {
        let medium = MemoryMedium::new();
        let store = AssignmentStore::new(&medium, EngineConfig::new().cookie_name("exp"));
        store.save(&sample_set());
        assert!(medium.read("exp").is_some());
        assert!(medium.read("ab_assignments").is_none());
    }

    #[test]
    fn test_cookie_attributes_render() {
        let config = EngineConfig::default();
        let expired = CookieAttributes::expired(&config);
        assert!(expired.is_expired());
        assert_eq!(
            expired.render(),
            "expires=Thu, 01 Jan 1970 00:00:00 GMT; max-age=0; path=/; SameSite=Lax"
        );

        let secure = CookieAttributes::expired(&config.secure(true));
        assert!(secure.render().ends_with("; Secure"));
    }

    #[test]
    fn test_cookie_from_header() {
        let header = "theme=dark; ab_assignments=%7B%7D ;session=abc";
        assert_eq!(cookie_from_header(header, "ab_assignments"), Some("%7B%7D"));
        assert_eq!(cookie_from_header(header, "session"), Some("abc"));
        assert_eq!(cookie_from_header(header, "missing"), None);
        assert_eq!(cookie_from_header("", "ab_assignments"), None);
    }

    #[test]
    fn test_set_cookie_header() {
        let config = EngineConfig::default();
        let header = set_cookie_header("ab", "v", &CookieAttributes::expired(&config));
        assert!(header.starts_with("ab=v; expires=Thu, 01 Jan 1970"));
    }
}
