//! Conditional parallel iteration over loan books.
//!
//! Uses rayon when the `parallel` feature is enabled and the config allows it
//! for the collection size. Results never depend on which path ran.

use crate::types::ClassifierConfig;

/// Maps a function over items, conditionally using parallel iteration.
///
/// Output order matches input order on both paths.
#[allow(unused_variables)]
pub fn maybe_parallel_map<T, U, F>(items: &[T], config: &ClassifierConfig, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}

/// Folds over items with a reduce step, conditionally using parallel iteration.
///
/// `reduce` must be associative and `identity` neutral for it, since the
/// parallel path folds chunks independently.
///
/// # Example
///
/// ```rust
/// use cartera_portfolio::{maybe_parallel_fold, ClassifierConfig};
///
/// let total = maybe_parallel_fold(
///     &[1usize, 2, 3],
///     &ClassifierConfig::sequential(),
///     0usize,
///     |acc, x| acc + x,
///     |a, b| a + b,
/// );
/// assert_eq!(total, 6);
/// ```
#[allow(unused_variables)]
pub fn maybe_parallel_fold<T, U, F, R>(
    items: &[T],
    config: &ClassifierConfig,
    identity: U,
    fold: F,
    reduce: R,
) -> U
where
    T: Sync,
    U: Send + Sync + Clone,
    F: Fn(U, &T) -> U + Sync + Send,
    R: Fn(U, U) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items
                .par_iter()
                .fold(|| identity.clone(), &fold)
                .reduce(|| identity.clone(), reduce);
        }
    }

    items.iter().fold(identity, fold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maybe_parallel_map() {
        let config = ClassifierConfig::sequential();
        let items = vec![1, 2, 3, 4, 5];
        let results: Vec<i32> = maybe_parallel_map(&items, &config, |x| x * 2);
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_paths_agree() {
        let items: Vec<u64> = (0..2_000).collect();
        let sequential = ClassifierConfig::sequential();
        let parallel = ClassifierConfig::default().with_threshold(1);

        let sum = |config: &ClassifierConfig| {
            maybe_parallel_fold(&items, config, 0u64, |acc, x| acc + x, |a, b| a + b)
        };
        assert_eq!(sum(&sequential), sum(&parallel));
        assert_eq!(
            maybe_parallel_map(&items, &sequential, |x| x % 7),
            maybe_parallel_map(&items, &parallel, |x| x % 7)
        );
    }
}
