//! Seeded stratified train/test split

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::features::ExampleDataset;

use super::errors::{TransformError, TransformResult};

/// Train and test partitions of one dataset
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub train: ExampleDataset,
    pub test: ExampleDataset,
}

/// Splits row indices per class so both partitions keep the class mix.
///
/// Each class contributes `round(count * test_size)` rows to the test set,
/// capped so at least one row stays in training. Classes with a single
/// example stay in training. Both index lists are ascending.
pub fn stratified_indices(
    labels: &[&str],
    test_size: f64,
    seed: u64,
) -> TransformResult<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TransformError::InvalidTestSize(test_size));
    }

    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut members in by_class.into_values() {
        members.shuffle(&mut rng);
        let n_test = if members.len() < 2 {
            0
        } else {
            ((members.len() as f64 * test_size).round() as usize).min(members.len() - 1)
        };
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    if train.is_empty() {
        return Err(TransformError::EmptyPartition("training"));
    }
    if test.is_empty() {
        return Err(TransformError::EmptyPartition("test"));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Seeded stratified split of a dataset
pub fn train_test_split(
    dataset: &ExampleDataset,
    test_size: f64,
    random_state: u64,
) -> TransformResult<SplitDataset> {
    let labels = dataset.targets();
    let (train, test) = stratified_indices(&labels, test_size, random_state)?;
    Ok(SplitDataset {
        train: dataset.select(&train),
        test: dataset.select(&test),
    })
}
