//! # Trueno-AB: Deterministic A/B Experiment Assignment
//!
//! **Version**: 0.1.0
//!
//! Trueno-AB assigns each visitor to one variant of each experiment and keeps
//! that assignment stable across calls, page loads and browser/server
//! contexts. Splits are weighted, assignments persist in a single cookie, and
//! a debug query parameter can force variants without touching stored state.
//!
//! ## Design Principles
//!
//! - **No surprises for callers**: assignment never fails; unknown
//!   experiments fall back to `"A"`, broken cookies read as empty
//! - **Explicit capabilities**: storage, randomness, time and analytics are
//!   injected, so the engine runs the same in a browser, on a server and in
//!   tests
//! - **Immutable configuration**: the registry is built once and never
//!   mutated
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_ab::registry::Registry;
//! use trueno_ab::store::HeaderMedium;
//! use trueno_ab::AssignmentEngine;
//!
//! let registry = Registry::from_json(
//!     r#"{"checkout": {"variants": [{"id": "A", "weight": 1}, {"id": "B", "weight": 1}]}}"#,
//! )?;
//!
//! // Server side: cookies in from the request, Set-Cookie out on the response
//! let medium = HeaderMedium::from_request(Some("session=abc"));
//! let mut engine = AssignmentEngine::builder(Arc::new(registry), &medium)
//!     .query("?ab_override=checkout:B")
//!     .build();
//!
//! assert_eq!(engine.get_variant("checkout"), "B");
//! assert!(medium.set_cookie_headers().is_empty());
//! # Ok::<(), trueno_ab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analytics;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod overrides;
pub mod registry;
pub mod selector;
pub mod store;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm;

pub use analytics::{AnalyticsSink, NoopSink, TracingSink};
pub use config::{EngineConfig, SameSite};
pub use engine::{variant_for_render, AssignmentEngine, EngineBuilder, Resolution, Source};
pub use error::{Error, Result};
pub use overrides::OverrideResolver;
pub use registry::{Experiment, Registry, Variant};
pub use selector::VariantSelector;
pub use store::{variant_from_cookie, Assignment, AssignmentSet, AssignmentStore, StorageMedium};
