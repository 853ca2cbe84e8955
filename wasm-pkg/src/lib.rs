//! Trueno-AB Browser Bundle
//!
//! WebAssembly package exposing experiment assignment to JavaScript:
//! - `Experiments` class over `document.cookie` and `location.search`
//! - `getVariantFromCookie` for raw cookie values

use wasm_bindgen::prelude::*;
use web_sys::console;

// Re-export bindings from parent crate
pub use trueno_ab::wasm::*;

/// Get bundle version
#[wasm_bindgen(js_name = bundleVersion)]
pub fn bundle_version() -> String {
    format!("trueno-ab-wasm v{}", env!("CARGO_PKG_VERSION"))
}

/// Log the active experiment ids from a registry JSON to the console
#[wasm_bindgen(js_name = logExperiments)]
pub fn log_experiments(registry_json: &str) -> Result<(), JsValue> {
    let registry = trueno_ab::Registry::from_json(registry_json)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    for experiment in registry.all() {
        console::log_1(&format!("{}: {} variants", experiment.id(), experiment.variants().len()).into());
    }
    Ok(())
}
