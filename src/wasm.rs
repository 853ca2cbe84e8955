//! WebAssembly bindings for in-browser experiment assignment.
//!
//! Exposes the engine to JavaScript over the live browser context:
//!
//! ```text
//! JS → wasm-bindgen → Experiments → AssignmentEngine
//!                                     ├── document.cookie  (DocumentMedium)
//!                                     ├── location.search  (debug overrides)
//!                                     └── JS callback      (analytics)
//! ```
//!
//! ```javascript
//! const experiments = new Experiments(registryJson, (exp, variant) => gtag("event", "experiment", { exp, variant }));
//! const variant = experiments.getVariant("checkout-button");
//! ```

#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, window, HtmlDocument};

use crate::analytics::AnalyticsSink;
use crate::clock::Clock;
use crate::registry::Registry;
use crate::store::{cookie_from_header, set_cookie_header, variant_from_cookie, CookieAttributes, StorageMedium};
use crate::AssignmentEngine;

/// Initialize WASM module with panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// `document.cookie` storage medium. Unavailable outside a document context
/// (workers, non-HTML documents).
#[derive(Debug, Default)]
pub struct DocumentMedium {
    document: Option<HtmlDocument>,
}

impl DocumentMedium {
    /// Bind to the current window's document, if there is one.
    #[must_use]
    pub fn new() -> Self {
        let document = window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok());
        Self { document }
    }
}

impl StorageMedium for DocumentMedium {
    fn read(&self, name: &str) -> Option<String> {
        let cookies = self.document.as_ref()?.cookie().ok()?;
        cookie_from_header(&cookies, name).map(str::to_string)
    }

    fn write(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        if let Some(document) = &self.document {
            if document
                .set_cookie(&set_cookie_header(name, value, attributes))
                .is_err()
            {
                console::warn_1(&"trueno-ab: failed to write assignment cookie".into());
            }
        }
    }

    fn remove(&self, name: &str, attributes: &CookieAttributes) {
        self.write(name, "", attributes);
    }

    fn is_available(&self) -> bool {
        self.document.is_some()
    }
}

/// Clock over `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }
}

/// Analytics sink calling a JS function `(experimentId, variantId) => void`.
#[derive(Debug, Default)]
pub struct JsAnalytics {
    callback: Option<js_sys::Function>,
}

impl AnalyticsSink for JsAnalytics {
    fn track_experiment(&mut self, experiment_id: &str, variant_id: &str) {
        if let Some(callback) = &self.callback {
            let result = callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(experiment_id),
                &JsValue::from_str(variant_id),
            );
            if let Err(e) = result {
                console::warn_2(&"trueno-ab: analytics callback threw".into(), &e);
            }
        }
    }
}

/// Browser-facing assignment engine.
#[wasm_bindgen]
pub struct Experiments {
    engine: AssignmentEngine<DocumentMedium, JsAnalytics>,
}

#[wasm_bindgen]
impl Experiments {
    /// Create from registry JSON and an optional analytics callback.
    #[wasm_bindgen(constructor)]
    pub fn new(registry_json: &str, track: Option<js_sys::Function>) -> Result<Experiments, JsValue> {
        let registry =
            Registry::from_json(registry_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let query = window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();

        let engine = AssignmentEngine::builder(Arc::new(registry), DocumentMedium::new())
            .analytics(JsAnalytics { callback: track })
            .query(query)
            .clock(JsClock)
            .build();
        Ok(Self { engine })
    }

    /// Resolve a variant. `trackAssignment` defaults to `true`.
    #[wasm_bindgen(js_name = getVariant)]
    pub fn get_variant(&mut self, experiment_id: &str, track_assignment: Option<bool>) -> String {
        self.engine
            .get_variant_with(experiment_id, track_assignment.unwrap_or(true))
    }

    /// Persist a variant without selection or validation.
    #[wasm_bindgen(js_name = forceVariant)]
    pub fn force_variant(&self, experiment_id: &str, variant_id: &str) {
        self.engine.force_variant(experiment_id, variant_id);
    }

    /// All stored assignments as a JSON string.
    #[wasm_bindgen(js_name = getAllAssignments)]
    pub fn get_all_assignments(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.get_all_assignments())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Expire the assignment cookie.
    #[wasm_bindgen(js_name = clearAssignments)]
    pub fn clear_assignments(&self) {
        self.engine.clear_assignments();
    }

    /// Configured traffic share of a variant, 0-100.
    #[wasm_bindgen(js_name = getVariantPercentage)]
    pub fn get_variant_percentage(&self, experiment_id: &str, variant_id: &str) -> u8 {
        self.engine.get_variant_percentage(experiment_id, variant_id)
    }
}

/// Stored variant for `experimentId` in a raw cookie value.
#[wasm_bindgen(js_name = getVariantFromCookie)]
pub fn get_variant_from_cookie(raw: &str, experiment_id: &str) -> Option<String> {
    variant_from_cookie(raw, experiment_id)
}
