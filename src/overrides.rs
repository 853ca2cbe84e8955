//! Debug override directive
//!
//! A single query parameter forces variants for the current call only:
//!
//! ```text
//! ?ab_override=checkout:B,pricing:2
//! ```
//!
//! The resolver only parses. Whether the named variant exists is checked by
//! the engine, which ignores overrides for unknown variants.

use url::form_urlencoded;

use crate::config::DEFAULT_OVERRIDE_PARAM;

/// Parsed `experimentId:variantId` pairs from the debug directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideResolver {
    pairs: Vec<(String, String)>,
}

impl OverrideResolver {
    /// A resolver with no overrides.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse the default override parameter out of a raw query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_query_param(query, DEFAULT_OVERRIDE_PARAM)
    }

    /// Parse `param` out of a raw query string. A leading `?` is ignored and
    /// only the first occurrence of the parameter is used.
    #[must_use]
    pub fn from_query_param(query: &str, param: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == param)
            .map(|(_, directive)| Self::from_directive(&directive))
            .unwrap_or_default()
    }

    /// Parse a bare directive value such as `expA:B,expC:2`.
    ///
    /// Tokens without a `:` or with an empty half are skipped. When an
    /// experiment appears twice the first token wins.
    #[must_use]
    pub fn from_directive(directive: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for token in directive.split(',') {
            let Some((experiment, variant)) = token.trim().split_once(':') else {
                continue;
            };
            let (experiment, variant) = (experiment.trim(), variant.trim());
            if experiment.is_empty() || variant.is_empty() {
                continue;
            }
            if pairs.iter().any(|(e, _)| e == experiment) {
                continue;
            }
            pairs.push((experiment.to_string(), variant.to_string()));
        }
        Self { pairs }
    }

    /// Forced variant for `experiment_id`, if the directive names one.
    #[must_use]
    pub fn resolve(&self, experiment_id: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(e, _)| e == experiment_id)
            .map(|(_, v)| v.as_str())
    }

    /// Check if the directive is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parsed overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
