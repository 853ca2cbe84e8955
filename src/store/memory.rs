//! In-memory storage medium using `DashMap`.
//!
//! Data is lost on process restart. Records the attributes of every write
//! and counts writes, so callers can observe persistence behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::{CookieAttributes, StorageMedium};

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    attributes: Option<CookieAttributes>,
}

/// In-process cookie jar.
///
/// # Example
///
/// ```rust
/// use trueno_ab::store::{MemoryMedium, StorageMedium};
///
/// let jar = MemoryMedium::new();
/// jar.insert_raw("ab_assignments", "%7B%7D");
/// assert_eq!(jar.read("ab_assignments").as_deref(), Some("%7B%7D"));
/// assert_eq!(jar.writes(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryMedium {
    cookies: DashMap<String, StoredCookie>,
    writes: AtomicUsize,
}

impl MemoryMedium {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value without attributes. Not counted as a write.
    pub fn insert_raw(&self, name: &str, value: &str) {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                attributes: None,
            },
        );
    }

    /// Attributes of the last write to `name`, if it is present.
    #[must_use]
    pub fn attributes(&self, name: &str) -> Option<CookieAttributes> {
        self.cookies.get(name).and_then(|c| c.attributes.clone())
    }

    /// Number of `write` and `remove` calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of cookies in the jar.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.value.clone())
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if attributes.is_expired() {
            self.cookies.remove(name);
            return;
        }
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                attributes: Some(attributes.clone()),
            },
        );
    }

    fn remove(&self, name: &str, _attributes: &CookieAttributes) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.cookies.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;

    #[test]
    fn test_memory_medium_write_read() {
        let jar = MemoryMedium::new();
        let attributes = CookieAttributes::persistent(&EngineConfig::default(), chrono::Utc::now());

        jar.write("c", "v1", &attributes);
        jar.write("c", "v2", &attributes);

        assert_eq!(jar.read("c").as_deref(), Some("v2"));
        assert_eq!(jar.writes(), 2);
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn test_memory_medium_expired_write_deletes() {
        let jar = MemoryMedium::new();
        jar.insert_raw("c", "v");

        jar.write("c", "v", &CookieAttributes::expired(&EngineConfig::default()));

        assert!(jar.read("c").is_none());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_memory_medium_remove_missing() {
        let jar = MemoryMedium::new();
        // Should not panic
        jar.remove("nonexistent", &CookieAttributes::expired(&EngineConfig::default()));
        assert_eq!(jar.writes(), 1);
    }
}
