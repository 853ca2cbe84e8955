//! Experiment and Variant - immutable experiment definitions

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One named alternative within an experiment.
///
/// Weights are relative magnitudes, not percentages: `[9.0, 1.0]` and
/// `[90.0, 10.0]` describe the same split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    id: String,
    weight: f64,
}

impl Variant {
    /// Create a variant. Validation happens when the owning experiment is built.
    #[must_use]
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }

    /// Get the variant ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the relative selection weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// A named A/B test with a fixed, ordered set of weighted variants.
///
/// Construct through [`Experiment::builder`] or [`Experiment::new`]; both
/// validate, so every `Experiment` value satisfies:
///
/// - at least one variant
/// - variant IDs are non-empty and unique
/// - every weight is finite and strictly positive
/// - the default variant, if set, names one of the variants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    id: String,
    variants: Vec<Variant>,
    #[serde(rename = "defaultVariant", skip_serializing_if = "Option::is_none")]
    default_variant: Option<String>,
}

impl Experiment {
    /// Create a validated experiment without a default variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExperiment`] if any invariant is violated.
    pub fn new(id: impl Into<String>, variants: Vec<Variant>) -> Result<Self> {
        Self::validated(id.into(), variants, None)
    }

    /// Create a builder for an experiment.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ExperimentBuilder {
        ExperimentBuilder::new(id)
    }

    pub(crate) fn validated(
        id: String,
        variants: Vec<Variant>,
        default_variant: Option<String>,
    ) -> Result<Self> {
        if id.is_empty() {
            return Err(Error::invalid(&id, "experiment id must not be empty"));
        }
        if variants.is_empty() {
            return Err(Error::invalid(&id, "at least one variant is required"));
        }
        for (i, variant) in variants.iter().enumerate() {
            if variant.id.is_empty() {
                return Err(Error::invalid(&id, format!("variant #{i} has an empty id")));
            }
            if !variant.weight.is_finite() || variant.weight <= 0.0 {
                return Err(Error::invalid(
                    &id,
                    format!(
                        "variant '{}' has weight {}, weights must be positive",
                        variant.id, variant.weight
                    ),
                ));
            }
            if variants[..i].iter().any(|v| v.id == variant.id) {
                return Err(Error::invalid(
                    &id,
                    format!("duplicate variant id '{}'", variant.id),
                ));
            }
        }
        let total: f64 = variants.iter().map(Variant::weight).sum();
        if !total.is_finite() {
            return Err(Error::invalid(
                &id,
                format!("total weight {total} overflows, scale the weights down"),
            ));
        }
        if let Some(default) = &default_variant {
            if !variants.iter().any(|v| &v.id == default) {
                return Err(Error::invalid(
                    &id,
                    format!("default variant '{default}' is not one of the variants"),
                ));
            }
        }

        Ok(Self {
            id,
            variants,
            default_variant,
        })
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the variants in declaration order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Get the default variant ID, if any.
    #[must_use]
    pub fn default_variant(&self) -> Option<&str> {
        self.default_variant.as_deref()
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Check whether `variant_id` belongs to this experiment.
    #[must_use]
    pub fn has_variant(&self, variant_id: &str) -> bool {
        self.variant(variant_id).is_some()
    }

    /// Sum of all variant weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.variants.iter().map(Variant::weight).sum()
    }

    /// Share of traffic routed to `variant_id`, rounded to a whole percent.
    ///
    /// Returns 0 for unknown variants. Percentages are rounded independently,
    /// so three equal variants report 33 each.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self, variant_id: &str) -> u8 {
        self.variant(variant_id).map_or(0, |variant| {
            (variant.weight / self.total_weight() * 100.0).round() as u8
        })
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    id: String,
    variants: Vec<Variant>,
    default_variant: Option<String>,
}

impl ExperimentBuilder {
    /// Create a new builder with the experiment ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variants: Vec::new(),
            default_variant: None,
        }
    }

    /// Append a weighted variant.
    #[must_use]
    pub fn variant(mut self, id: impl Into<String>, weight: f64) -> Self {
        self.variants.push(Variant::new(id, weight));
        self
    }

    /// Set the default variant.
    #[must_use]
    pub fn default_variant(mut self, id: impl Into<String>) -> Self {
        self.default_variant = Some(id.into());
        self
    }

    /// Build and validate the `Experiment`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExperiment`] if any invariant is violated.
    pub fn build(self) -> Result<Experiment> {
        Experiment::validated(self.id, self.variants, self.default_variant)
    }
}
