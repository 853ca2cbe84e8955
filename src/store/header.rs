//! Server-side storage medium over HTTP cookie headers.
//!
//! Seeded from the request's `Cookie` header; every write is queued as a
//! `Set-Cookie` value for the response. Later reads in the same request see
//! the pending writes.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{set_cookie_header, CookieAttributes, StorageMedium};

/// Request-scoped cookie medium.
///
/// # Example
///
/// ```rust
/// use trueno_ab::store::{HeaderMedium, StorageMedium};
///
/// let medium = HeaderMedium::from_request(Some("theme=dark; ab_assignments=%7B%7D"));
/// assert_eq!(medium.read("ab_assignments").as_deref(), Some("%7B%7D"));
/// assert!(medium.set_cookie_headers().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct HeaderMedium {
    jar: RefCell<BTreeMap<String, String>>,
    outgoing: RefCell<Vec<String>>,
}

impl HeaderMedium {
    /// Parse an incoming `Cookie` header. `None` means the request had none.
    #[must_use]
    pub fn from_request(cookie_header: Option<&str>) -> Self {
        let mut jar = BTreeMap::new();
        for pair in cookie_header.into_iter().flat_map(|header| header.split(';')) {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            // First occurrence wins, same as `cookie_from_header`
            jar.entry(name.to_string())
                .or_insert_with(|| value.trim().to_string());
        }

        Self {
            jar: RefCell::new(jar),
            outgoing: RefCell::new(Vec::new()),
        }
    }

    /// `Set-Cookie` values queued so far, oldest first.
    #[must_use]
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.outgoing.borrow().clone()
    }

    /// Drain the queued `Set-Cookie` values.
    pub fn take_set_cookie_headers(&self) -> Vec<String> {
        std::mem::take(&mut *self.outgoing.borrow_mut())
    }
}

impl StorageMedium for HeaderMedium {
    fn read(&self, name: &str) -> Option<String> {
        self.jar.borrow().get(name).cloned()
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        if attributes.is_expired() {
            self.jar.borrow_mut().remove(name);
        } else {
            self.jar
                .borrow_mut()
                .insert(name.to_string(), value.to_string());
        }
        self.outgoing
            .borrow_mut()
            .push(set_cookie_header(name, value, attributes));
    }

    fn remove(&self, name: &str, attributes: &CookieAttributes) {
        self.jar.borrow_mut().remove(name);
        self.outgoing
            .borrow_mut()
            .push(set_cookie_header(name, "", attributes));
    }
}
