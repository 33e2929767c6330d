//! Guard configuration

use serde::{Deserialize, Serialize};

/// Default number of registry entries before the first dead-entry sweep
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Configuration for a [`Guard`](crate::Guard) factory
///
/// Every field has a default, so a partial table deserializes cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Whether views reject mutations with an error instead of ignoring them
    pub strict: bool,
    /// Registry size that triggers a sweep of collected targets
    pub sweep_threshold: usize,
}

impl GuardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict configuration
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self::default().with_strict(true)
    }

    /// With strictness
    #[inline]
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// With sweep threshold (clamped to at least 1)
    #[inline]
    #[must_use]
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold.max(1);
        self
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            strict: false,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let config = GuardConfig::new();
        assert!(!config.strict);
        assert_eq!(config.sweep_threshold, DEFAULT_SWEEP_THRESHOLD);
        assert!(GuardConfig::strict().strict);
    }

    #[test]
    fn sweep_threshold_never_zero() {
        assert_eq!(GuardConfig::new().with_sweep_threshold(0).sweep_threshold, 1);
    }

    #[test]
    fn deserializes_partial_table() {
        let config: GuardConfig = serde_json::from_str(r#"{ "strict": true }"#).unwrap();
        assert!(config.strict);
        assert_eq!(config.sweep_threshold, DEFAULT_SWEEP_THRESHOLD);

        let config: GuardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GuardConfig::default());
    }
}
