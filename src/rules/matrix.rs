//! Directed group-pair force coefficients
//!
//! `coefficient(a, b)` is how strongly particles of group `a` are pulled toward
//! (positive) or pushed away from (negative) particles of group `b`. The table
//! is asymmetric: `(a, b)` says nothing about how `b` reacts to `a`.

use ahash::AHashMap;
use rand::Rng;

use crate::core::error::{EngineError, Result};
use crate::core::types::GroupId;

#[derive(Debug, Clone, Default)]
pub struct RuleMatrix {
    coefficients: AHashMap<(GroupId, GroupId), f32>,
}

impl RuleMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing entries read as 0.0 (no radial force, collisions still apply)
    pub fn get(&self, a: GroupId, b: GroupId) -> f32 {
        self.coefficients.get(&(a, b)).copied().unwrap_or(0.0)
    }

    /// Set a coefficient; NaN and infinities are rejected
    pub fn set(&mut self, a: GroupId, b: GroupId, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(EngineError::InvalidCoefficient { a, b, value });
        }
        self.coefficients.insert((a, b), value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.coefficients.clear();
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Fill every ordered pair (including self pairs) uniformly from `[-spread, spread)`
    ///
    /// Pairs are visited in `groups` order so the result depends only on the
    /// RNG state.
    pub fn randomize<R: Rng>(&mut self, groups: &[GroupId], spread: f32, rng: &mut R) {
        self.coefficients.clear();
        if spread <= 0.0 {
            return;
        }
        for &a in groups {
            for &b in groups {
                let value = rng.gen_range(-spread..spread);
                self.coefficients.insert((a, b), value);
            }
        }
    }

    /// Entries sorted by (a, b) for stable display/export
    pub fn entries(&self) -> Vec<((GroupId, GroupId), f32)> {
        let mut entries: Vec<_> = self.coefficients.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_missing_entry_is_zero() {
        let matrix = RuleMatrix::new();
        assert_eq!(matrix.get(GroupId(0), GroupId(1)), 0.0);
    }

    #[test]
    fn test_matrix_is_asymmetric() {
        let mut matrix = RuleMatrix::new();
        matrix.set(GroupId(0), GroupId(1), 0.5).unwrap();
        assert_eq!(matrix.get(GroupId(0), GroupId(1)), 0.5);
        assert_eq!(matrix.get(GroupId(1), GroupId(0)), 0.0);
    }

    #[test]
    fn test_non_finite_rejected_without_change() {
        let mut matrix = RuleMatrix::new();
        matrix.set(GroupId(0), GroupId(0), -0.1).unwrap();

        assert!(matrix.set(GroupId(0), GroupId(0), f32::NAN).is_err());
        assert!(matrix.set(GroupId(0), GroupId(0), f32::INFINITY).is_err());
        assert_eq!(matrix.get(GroupId(0), GroupId(0)), -0.1);
    }

    #[test]
    fn test_randomize_is_seeded_and_bounded() {
        let groups = [GroupId(0), GroupId(1), GroupId(2)];
        let mut first = RuleMatrix::new();
        let mut second = RuleMatrix::new();
        first.randomize(&groups, 0.3, &mut ChaCha8Rng::seed_from_u64(42));
        second.randomize(&groups, 0.3, &mut ChaCha8Rng::seed_from_u64(42));

        assert_eq!(first.len(), 9);
        assert_eq!(first.entries(), second.entries());
        assert!(first.entries().iter().all(|(_, v)| (-0.3..0.3).contains(v)));
    }
}
