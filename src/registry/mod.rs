//! Experiment Registry
//!
//! A static table of experiments, defined once at startup and read-only
//! afterwards. There is no mutation API: build a [`Registry`], then either
//! hand it to an engine directly or [`install`] it process-wide.
//!
//! ## Configuration Surface
//!
//! ```text
//! {
//!   "checkout-button": {
//!     "variants": [{ "id": "A", "weight": 1 }, { "id": "B", "weight": 1 }],
//!     "defaultVariant": "A"
//!   }
//! }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_ab::registry::{Experiment, Registry};
//!
//! let registry = Registry::builder()
//!     .experiment(
//!         Experiment::builder("checkout-button")
//!             .variant("A", 1.0)
//!             .variant("B", 1.0)
//!             .build()?,
//!     )
//!     .build()?;
//!
//! assert!(registry.get("checkout-button").is_some());
//! assert!(registry.get("unknown").is_none());
//! # Ok::<(), trueno_ab::Error>(())
//! ```

mod experiment;

pub use experiment::{Experiment, ExperimentBuilder, Variant};

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{Error, Result};

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Immutable table of experiments keyed by ID.
///
/// Iteration order is the order experiments were added (sorted by ID when
/// loaded from JSON).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    experiments: Vec<Experiment>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry. Every lookup against it is absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Parse and validate a registry from its JSON configuration surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed JSON and
    /// [`Error::InvalidExperiment`] for definitions that violate an invariant.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawExperiment> =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("registry JSON: {e}")))?;

        raw.into_iter()
            .try_fold(Self::builder(), |builder, (id, def)| {
                Experiment::validated(id, def.variants, def.default_variant)
                    .map(|experiment| builder.experiment(experiment))
            })?
            .build()
    }

    /// Look up an experiment. Absence is an expected outcome.
    #[must_use]
    pub fn get(&self, experiment_id: &str) -> Option<&Experiment> {
        self.index
            .get(experiment_id)
            .map(|&position| &self.experiments[position])
    }

    /// Check whether an experiment is registered.
    #[must_use]
    pub fn contains(&self, experiment_id: &str) -> bool {
        self.index.contains_key(experiment_id)
    }

    /// All experiments in stable order.
    #[must_use]
    pub fn all(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Number of registered experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if no experiments are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

/// Builder for `Registry`.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    experiments: Vec<Experiment>,
}

impl RegistryBuilder {
    /// Add an experiment.
    #[must_use]
    pub fn experiment(mut self, experiment: Experiment) -> Self {
        self.experiments.push(experiment);
        self
    }

    /// Build the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExperiment`] if two experiments share an ID.
    pub fn build(self) -> Result<Registry> {
        let mut index = FxHashMap::default();
        for (position, experiment) in self.experiments.iter().enumerate() {
            if index.insert(experiment.id().to_string(), position).is_some() {
                return Err(Error::invalid(experiment.id(), "duplicate experiment id"));
            }
        }
        Ok(Registry {
            experiments: self.experiments,
            index,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawExperiment {
    variants: Vec<Variant>,
    #[serde(default)]
    default_variant: Option<String>,
}

/// Install the process-wide registry. Succeeds exactly once.
///
/// # Errors
///
/// Returns [`Error::RegistryAlreadyInstalled`] on every call after the first.
pub fn install(registry: Registry) -> Result<Arc<Registry>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(Arc::clone(&registry))
        .map_err(|_| Error::RegistryAlreadyInstalled)?;
    tracing::debug!(experiments = registry.len(), "experiment registry installed");
    Ok(registry)
}

/// The process-wide registry, if one has been installed.
#[must_use]
pub fn global() -> Option<Arc<Registry>> {
    GLOBAL.get().cloned()
}
