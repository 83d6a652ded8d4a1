//! Minority-class upsampling

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Imbalance ratio below which upsampling kicks in
pub const IMBALANCE_RATIO: f64 = 0.5;

/// Row indices of a class-balanced resample, or `None` when the labels
/// are balanced enough already.
///
/// Balancing happens only when the smallest class is below half the
/// largest. Every smaller class is then drawn with replacement up to the
/// majority size; the majority classes are kept as they are.
pub fn balance_indices(labels: &[&str], seed: u64) -> Option<Vec<usize>> {
    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    if by_class.len() <= 1 {
        return None;
    }

    let largest = by_class.values().map(Vec::len).max().unwrap_or(0);
    let smallest = by_class.values().map(Vec::len).min().unwrap_or(0);
    if smallest as f64 >= largest as f64 * IMBALANCE_RATIO {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = Vec::with_capacity(largest * by_class.len());
    for members in by_class.values() {
        if members.len() < largest {
            for _ in 0..largest {
                indices.push(members[rng.gen_range(0..members.len())]);
            }
        } else {
            indices.extend_from_slice(members);
        }
    }
    Some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(labels: &[&str], indices: &[usize]) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for &i in indices {
            *out.entry(labels[i].to_string()).or_insert(0) += 1;
        }
        out
    }

    #[test]
    fn test_balanced_labels_untouched() {
        assert!(balance_indices(&["a", "b", "a", "b", "a"], 42).is_none());
        assert!(balance_indices(&["a", "a"], 42).is_none());
    }

    #[test]
    fn test_minorities_upsampled_to_majority() {
        let labels = ["a", "a", "a", "a", "a", "a", "b", "c", "c"];
        let indices = balance_indices(&labels, 42).unwrap();
        let c = counts(&labels, &indices);
        assert_eq!(c["a"], 6);
        assert_eq!(c["b"], 6);
        assert_eq!(c["c"], 6);
    }

    #[test]
    fn test_seeded_resample_is_deterministic() {
        let labels = ["a", "a", "a", "a", "a", "b", "c", "c"];
        assert_eq!(balance_indices(&labels, 7), balance_indices(&labels, 7));
    }
}
