//! Weighted variant selection
//!
//! Draws `r` uniformly from `[0, total_weight)` and walks the variants in
//! order, returning the first whose cumulative weight is strictly greater
//! than `r`. Each variant therefore wins with probability
//! `weight / total_weight`, and a draw landing exactly on a boundary goes to
//! the next variant.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::registry::Variant;

/// Weighted selector over an injected, seedable random source.
#[derive(Debug, Clone)]
pub struct VariantSelector {
    rng: StdRng,
}

impl VariantSelector {
    /// Deterministic selector for tests and replays.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Selector seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Pick one variant proportional to weight.
    ///
    /// Returns `None` only for an empty slice. Registry validation guarantees
    /// non-empty slices with positive weights.
    pub fn select<'a>(&mut self, variants: &'a [Variant]) -> Option<&'a str> {
        let total: f64 = variants.iter().map(Variant::weight).sum();
        if !(total.is_finite() && total > 0.0) {
            return variants.last().map(Variant::id);
        }
        let r = self.rng.gen_range(0.0..total);
        select_with_draw(variants, r)
    }
}

impl Default for VariantSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// The deterministic walk behind [`VariantSelector::select`] for a given draw.
///
/// Falls back to the last variant when no cumulative weight exceeds `r`.
#[must_use]
pub fn select_with_draw(variants: &[Variant], r: f64) -> Option<&str> {
    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.weight();
        if r < cumulative {
            return Some(variant.id());
        }
    }
    variants.last().map(Variant::id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants(weights: &[(&str, f64)]) -> Vec<Variant> {
        weights.iter().map(|(id, w)| Variant::new(*id, *w)).collect()
    }

    #[test]
    fn test_select_with_draw_boundaries() {
        let vs = variants(&[("A", 1.0), ("B", 1.0), ("C", 2.0)]);

        assert_eq!(select_with_draw(&vs, 0.0), Some("A"));
        assert_eq!(select_with_draw(&vs, 0.999), Some("A"));
        // Exactly on a boundary goes to the next variant
        assert_eq!(select_with_draw(&vs, 1.0), Some("B"));
        assert_eq!(select_with_draw(&vs, 2.0), Some("C"));
        assert_eq!(select_with_draw(&vs, 3.999), Some("C"));
    }

    #[test]
    fn test_select_with_draw_fallback_to_last() {
        let vs = variants(&[("A", 1.0), ("B", 1.0)]);
        assert_eq!(select_with_draw(&vs, 2.0), Some("B"));
        assert_eq!(select_with_draw(&vs, f64::NAN), Some("B"));
        assert_eq!(select_with_draw(&[], 0.5), None);
    }

    #[test]
    fn test_select_single_variant() {
        let mut selector = VariantSelector::from_seed(7);
        let vs = variants(&[("only", 0.25)]);
        for _ in 0..100 {
            assert_eq!(selector.select(&vs), Some("only"));
        }
    }

    #[test]
    fn test_select_is_reproducible_for_seed() {
        let vs = variants(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let mut first = VariantSelector::from_seed(42);
        let mut second = VariantSelector::from_seed(42);

        let a: Vec<_> = (0..50).map(|_| first.select(&vs)).collect();
        let b: Vec<_> = (0..50).map(|_| second.select(&vs)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_large_weights_stay_proportional() {
        let vs = variants(&[("A", 1e307), ("B", 1e307)]);
        let mut selector = VariantSelector::from_seed(31);
        let n = 10_000;
        let a_count = (0..n).filter(|_| selector.select(&vs) == Some("A")).count();

        #[allow(clippy::cast_precision_loss)]
        let share = a_count as f64 / f64::from(n);
        assert!((share - 0.5).abs() < 0.03, "share of A was {share}");
    }

    #[test]
    fn test_select_distribution() {
        let vs = variants(&[("A", 9.0), ("B", 1.0)]);
        let mut selector = VariantSelector::from_seed(2024);
        let n = 100_000;
        let a_count = (0..n).filter(|_| selector.select(&vs) == Some("A")).count();

        #[allow(clippy::cast_precision_loss)]
        let share = a_count as f64 / f64::from(n);
        assert!((share - 0.9).abs() < 0.01, "share of A was {share}");
    }
}
