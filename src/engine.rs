//! Assignment Orchestrator
//!
//! [`AssignmentEngine::get_variant`] resolves a variant under a fixed
//! precedence, first match wins:
//!
//! ```text
//! 1. unknown experiment  -> fallback "A"        (no write, no event)
//! 2. debug override      -> forced variant       (no write, no event)
//! 3. stored assignment   -> stored variant       (no write, no event)
//! 4. fresh assignment    -> weighted selection   (write, one event if tracked)
//! ```
//!
//! Overrides and stored assignments are only honoured while their variant is
//! still part of the experiment. The engine keeps no cache: every call
//! round-trips through the store.

use std::sync::Arc;

use crate::analytics::{AnalyticsSink, NoopSink};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::overrides::OverrideResolver;
use crate::registry::Registry;
use crate::selector::VariantSelector;
use crate::store::{variant_from_cookie, Assignment, AssignmentSet, AssignmentStore, StorageMedium};

/// Where a resolved variant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Experiment unknown; configured fallback variant
    Fallback,
    /// Debug override directive
    Override,
    /// Previously persisted assignment
    Stored,
    /// New weighted selection, now persisted
    Fresh,
}

/// A resolved variant and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    variant_id: String,
    source: Source,
}

impl Resolution {
    fn new(variant_id: impl Into<String>, source: Source) -> Self {
        Self {
            variant_id: variant_id.into(),
            source,
        }
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the source of the variant.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Consume into the variant ID.
    #[must_use]
    pub fn into_variant_id(self) -> String {
        self.variant_id
    }
}

/// Per-visitor assignment engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use trueno_ab::registry::{Experiment, Registry};
/// use trueno_ab::store::MemoryMedium;
/// use trueno_ab::AssignmentEngine;
///
/// let registry = Registry::builder()
///     .experiment(Experiment::builder("hero").variant("A", 1.0).variant("B", 1.0).build()?)
///     .build()?;
///
/// let jar = MemoryMedium::new();
/// let mut engine = AssignmentEngine::builder(Arc::new(registry), &jar).seed(7).build();
///
/// let first = engine.get_variant("hero");
/// assert_eq!(engine.get_variant("hero"), first);
/// assert_eq!(engine.get_variant("nonexistent-experiment-id"), "A");
/// # Ok::<(), trueno_ab::Error>(())
/// ```
pub struct AssignmentEngine<M, A = NoopSink> {
    registry: Arc<Registry>,
    store: AssignmentStore<M>,
    overrides: OverrideResolver,
    selector: VariantSelector,
    analytics: A,
}

impl<M: StorageMedium> AssignmentEngine<M, NoopSink> {
    /// Engine with default configuration, no overrides and no analytics.
    #[must_use]
    pub fn new(registry: Arc<Registry>, medium: M) -> Self {
        Self::builder(registry, medium).build()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder(registry: Arc<Registry>, medium: M) -> EngineBuilder<M, NoopSink> {
        EngineBuilder::new(registry, medium)
    }
}

impl<M: StorageMedium, A: AnalyticsSink> AssignmentEngine<M, A> {
    /// Resolve the visitor's variant, tracking fresh assignments.
    pub fn get_variant(&mut self, experiment_id: &str) -> String {
        self.resolve(experiment_id, true).into_variant_id()
    }

    /// Resolve the visitor's variant, optionally suppressing the analytics
    /// event for a fresh assignment.
    pub fn get_variant_with(&mut self, experiment_id: &str, track_assignment: bool) -> String {
        self.resolve(experiment_id, track_assignment)
            .into_variant_id()
    }

    /// Resolve the visitor's variant and report where it came from.
    pub fn resolve(&mut self, experiment_id: &str, track_assignment: bool) -> Resolution {
        let registry = Arc::clone(&self.registry);
        let Some(experiment) = registry.get(experiment_id) else {
            tracing::warn!(experiment_id, "unknown experiment, using fallback variant");
            return Resolution::new(self.fallback(), Source::Fallback);
        };

        if let Some(forced) = self.overrides.resolve(experiment_id) {
            if experiment.has_variant(forced) {
                tracing::debug!(experiment_id, variant_id = forced, "debug override");
                return Resolution::new(forced, Source::Override);
            }
            tracing::debug!(
                experiment_id,
                variant_id = forced,
                "ignoring override for unknown variant"
            );
        }

        let mut assignments = self.store.load();
        if let Some(stored) = assignments.get(experiment_id) {
            if experiment.has_variant(stored.variant_id()) {
                return Resolution::new(stored.variant_id(), Source::Stored);
            }
            tracing::debug!(
                experiment_id,
                variant_id = stored.variant_id(),
                "stored variant no longer exists, reassigning"
            );
        }

        let variant_id = match self.selector.select(experiment.variants()) {
            Some(id) => id.to_string(),
            None => self.fallback(),
        };
        assignments.insert(
            experiment_id.to_string(),
            Assignment::new(experiment_id, variant_id.as_str(), self.store.now_millis()),
        );
        self.store.save(&assignments);
        tracing::debug!(experiment_id, variant_id = %variant_id, "fresh assignment");

        if track_assignment {
            self.analytics.track_experiment(experiment_id, &variant_id);
        }
        Resolution::new(variant_id, Source::Fresh)
    }

    /// Unconditionally persist `variant_id` for `experiment_id`.
    ///
    /// Bypasses weighted selection and does not check that the variant
    /// exists. A variant the registry does not know is discarded by the next
    /// `get_variant`.
    pub fn force_variant(&self, experiment_id: &str, variant_id: &str) {
        let mut assignments = self.store.load();
        assignments.insert(
            experiment_id.to_string(),
            Assignment::new(experiment_id, variant_id, self.store.now_millis()),
        );
        self.store.save(&assignments);
        tracing::debug!(experiment_id, variant_id, "forced assignment");
    }

    /// The raw stored assignment set.
    #[must_use]
    pub fn get_all_assignments(&self) -> AssignmentSet {
        self.store.load()
    }

    /// Expire every stored assignment.
    pub fn clear_assignments(&self) {
        self.store.clear();
    }

    /// Configured traffic share of a variant as a whole percent, 0 if unknown.
    #[must_use]
    pub fn get_variant_percentage(&self, experiment_id: &str, variant_id: &str) -> u8 {
        self.registry
            .get(experiment_id)
            .map_or(0, |experiment| experiment.percentage(variant_id))
    }

    /// The registry in use.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &AssignmentStore<M> {
        &self.store
    }

    /// The analytics sink.
    #[must_use]
    pub const fn analytics(&self) -> &A {
        &self.analytics
    }

    fn fallback(&self) -> String {
        self.store.config().get_fallback_variant().to_string()
    }
}

impl<M, A> std::fmt::Debug for AssignmentEngine<M, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentEngine")
            .field("experiments", &self.registry.len())
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// Builder for `AssignmentEngine`.
pub struct EngineBuilder<M, A> {
    registry: Arc<Registry>,
    medium: M,
    analytics: A,
    config: EngineConfig,
    query: Option<String>,
    overrides: Option<OverrideResolver>,
    selector: Option<VariantSelector>,
    clock: Box<dyn Clock>,
}

impl<M: StorageMedium> EngineBuilder<M, NoopSink> {
    /// Create a builder with required fields.
    #[must_use]
    pub fn new(registry: Arc<Registry>, medium: M) -> Self {
        Self {
            registry,
            medium,
            analytics: NoopSink,
            config: EngineConfig::default(),
            query: None,
            overrides: None,
            selector: None,
            clock: Box::new(SystemClock),
        }
    }
}

impl<M: StorageMedium, A: AnalyticsSink> EngineBuilder<M, A> {
    /// Set the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the analytics sink.
    #[must_use]
    pub fn analytics<B: AnalyticsSink>(self, analytics: B) -> EngineBuilder<M, B> {
        EngineBuilder {
            registry: self.registry,
            medium: self.medium,
            analytics,
            config: self.config,
            query: self.query,
            overrides: self.overrides,
            selector: self.selector,
            clock: self.clock,
        }
    }

    /// Read debug overrides from the request's query string, using the
    /// configured override parameter.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Use an already parsed override directive. Takes precedence over
    /// [`query`](Self::query).
    #[must_use]
    pub fn overrides(mut self, overrides: OverrideResolver) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Seed the variant selector for reproducible assignment.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.selector = Some(VariantSelector::from_seed(seed));
        self
    }

    /// Use a specific selector.
    #[must_use]
    pub fn selector(mut self, selector: VariantSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the clock used for `assignedAt` and cookie expiry.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Build the `AssignmentEngine`.
    #[must_use]
    pub fn build(self) -> AssignmentEngine<M, A> {
        let overrides = self
            .overrides
            .or_else(|| {
                self.query.as_deref().map(|query| {
                    OverrideResolver::from_query_param(query, self.config.get_override_param())
                })
            })
            .unwrap_or_default();

        AssignmentEngine {
            registry: self.registry,
            store: AssignmentStore::with_clock(self.medium, self.config, self.clock),
            overrides,
            selector: self.selector.unwrap_or_default(),
            analytics: self.analytics,
        }
    }
}

/// Variant to render in a context that must not assign, such as a server
/// render without write access to the visitor's cookies.
///
/// Returns the stored variant if it is still valid, else the experiment's
/// default variant, else its first variant. Unknown experiments get the
/// configured fallback variant, matching [`AssignmentEngine::get_variant`].
#[must_use]
pub fn variant_for_render(
    registry: &Registry,
    raw_cookie: Option<&str>,
    experiment_id: &str,
    config: &EngineConfig,
) -> String {
    let Some(experiment) = registry.get(experiment_id) else {
        return config.get_fallback_variant().to_string();
    };

    raw_cookie
        .and_then(|raw| variant_from_cookie(raw, experiment_id))
        .filter(|variant_id| experiment.has_variant(variant_id))
        .or_else(|| experiment.default_variant().map(str::to_string))
        .or_else(|| experiment.variants().first().map(|v| v.id().to_string()))
        .unwrap_or_else(|| config.get_fallback_variant().to_string())
}
