//! Assignment cookie wire format
//!
//! ```text
//! urlencode({"<experimentId>": {"experimentId": .., "variantId": .., "assignedAt": <epoch ms>}, ..})
//! ```
//!
//! Decoding accepts the percent-encoded form and bare JSON. Anything else
//! decodes to `None`, which callers treat as an empty set.

use std::borrow::Cow;

use super::AssignmentSet;
use crate::Result;

/// Serialize and percent-encode an assignment set for cookie storage.
///
/// # Errors
///
/// Returns [`Error::Serialization`](crate::Error::Serialization) if JSON
/// serialization fails.
pub fn encode(assignments: &AssignmentSet) -> Result<String> {
    let json = serde_json::to_string(assignments)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// Decode a raw cookie value. Returns `None` for empty or malformed input.
#[must_use]
pub fn decode(raw: &str) -> Option<AssignmentSet> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let json: Cow<'_, str> = if raw.starts_with('{') {
        Cow::Borrowed(raw)
    } else {
        match urlencoding::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "assignment cookie is not valid percent-encoding");
                return None;
            }
        }
    };

    match serde_json::from_str(&json) {
        Ok(assignments) => Some(assignments),
        Err(e) => {
            tracing::debug!(error = %e, "discarding malformed assignment cookie");
            None
        }
    }
}

/// Look up an experiment's stored variant in a raw cookie value.
///
/// Works without any storage medium, e.g. on a server holding only the
/// request's `Cookie` header. No validation against the registry happens
/// here.
#[must_use]
pub fn variant_from_cookie(raw: &str, experiment_id: &str) -> Option<String> {
    decode(raw)?
        .remove(experiment_id)
        .map(|assignment| assignment.variant_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Assignment;

    fn set_of(pairs: &[(&str, &str)]) -> AssignmentSet {
        pairs
            .iter()
            .map(|(e, v)| ((*e).to_string(), Assignment::new(*e, *v, 1_700_000_000_000)))
            .collect()
    }

    #[test]
    fn test_encode_is_cookie_safe() {
        let encoded = encode(&set_of(&[("hero", "B"), ("pricing; x", "2")])).unwrap();
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains(','));
        assert!(!encoded.contains('"'));
        assert!(!encoded.contains(' '));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_string(&set_of(&[("hero", "B")])).unwrap();
        assert_eq!(
            json,
            r#"{"hero":{"experimentId":"hero","variantId":"B","assignedAt":1700000000000}}"#
        );
    }

    #[test]
    fn test_decode_bare_json() {
        let raw = r#"{"hero":{"experimentId":"hero","variantId":"C","assignedAt":5}}"#;
        let set = decode(raw).unwrap();
        assert_eq!(set["hero"].variant_id(), "C");
        assert_eq!(set["hero"].assigned_at(), 5);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("").is_none());
        assert!(decode("   ").is_none());
        assert!(decode("hello").is_none());
        assert!(decode("%7B%22hero%22").is_none());
        assert!(decode("%FF%FE").is_none());
        assert!(decode("[1,2,3]").is_none());
    }

    #[test]
    fn test_variant_from_cookie() {
        let raw = encode(&set_of(&[("hero", "B"), ("pricing", "2")])).unwrap();
        assert_eq!(variant_from_cookie(&raw, "hero").as_deref(), Some("B"));
        assert_eq!(variant_from_cookie(&raw, "pricing").as_deref(), Some("2"));
        assert_eq!(variant_from_cookie(&raw, "absent"), None);
        assert_eq!(variant_from_cookie("garbage", "hero"), None);
    }
}
