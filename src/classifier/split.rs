//! Seeded stratified train/test split

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::models::Label;

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for a class of `n` rows. At least one row lands on
/// each side whenever the class has two or more rows.
pub fn test_count(n: usize, ratio: f64) -> usize {
    let wanted = (n as f64 * ratio).round() as usize;
    if n >= 2 {
        wanted.clamp(1, n - 1)
    } else {
        wanted.min(n)
    }
}

/// Stratified split: each class contributes `test_count(n_c, ratio)` rows to
/// the test partition, so class proportions match on both sides. The same
/// seed and labels always give the same split.
pub fn stratified_split(labels: &[Label], test_ratio: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in Label::all() {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);

        let n_test = test_count(indices.len(), test_ratio);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(normal: usize, fa: usize) -> Vec<Label> {
        std::iter::repeat_n(Label::Normal, normal)
            .chain(std::iter::repeat_n(Label::Fa, fa))
            .collect()
    }

    #[test]
    fn test_stratified_proportions() {
        let y = labels(18, 80);
        let split = stratified_split(&y, 0.2, 42);
        assert_eq!(split.train.len() + split.test.len(), 98);

        let test_fa = split.test.iter().filter(|&&i| y[i] == Label::Fa).count();
        let test_normal = split.test.len() - test_fa;
        assert_eq!(test_fa, 16);
        assert_eq!(test_normal, 4);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let y = labels(7, 13);
        let split = stratified_split(&y, 0.25, 1);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels(10, 30);
        assert_eq!(stratified_split(&y, 0.2, 42), stratified_split(&y, 0.2, 42));
        assert_ne!(
            stratified_split(&y, 0.2, 42).test,
            stratified_split(&y, 0.2, 43).test
        );
    }

    #[test]
    fn test_small_classes_keep_one_on_each_side() {
        assert_eq!(test_count(2, 0.2), 1);
        assert_eq!(test_count(3, 0.01), 1);
        assert_eq!(test_count(3, 0.99), 2);
        assert_eq!(test_count(1, 0.2), 0);
        assert_eq!(test_count(0, 0.2), 0);
    }
}
