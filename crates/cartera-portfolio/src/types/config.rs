//! Configuration for classifier computation.

use serde::{Deserialize, Serialize};

use cartera_config::ClassifierSettings;

/// Controls when loan books are classified in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Enable parallel processing (requires 'parallel' feature).
    pub parallel: bool,

    /// Minimum loan count to trigger parallel processing.
    pub parallel_threshold: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 500,
        }
    }
}

impl ClassifierConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always uses sequential processing.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}

impl From<&ClassifierSettings> for ClassifierConfig {
    fn from(settings: &ClassifierSettings) -> Self {
        Self {
            parallel: settings.parallel,
            parallel_threshold: settings.parallel_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ClassifierConfig::default();
        assert!(config.parallel);
        assert_eq!(config.parallel_threshold, 500);
    }

    #[test]
    fn test_sequential_never_parallelizes() {
        let config = ClassifierConfig::sequential().with_threshold(1);
        assert!(!config.should_parallelize(10_000));
    }

    #[test]
    fn test_threshold() {
        let config = ClassifierConfig::default().with_threshold(10);
        assert!(!config.should_parallelize(5));
        assert_eq!(config.should_parallelize(10), cfg!(feature = "parallel"));
    }

    #[test]
    fn test_from_settings() {
        let settings = ClassifierSettings {
            parallel: false,
            parallel_threshold: 42,
        };
        let config = ClassifierConfig::from(&settings);
        assert!(!config.parallel);
        assert_eq!(config.parallel_threshold, 42);
    }
}
