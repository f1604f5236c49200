//! Container configuration.

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Resolution limits. Deserialized from JSON, missing fields take the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Track the types under construction and fail with `CyclicDependency` on re-entry.
    /// When off, cycles still stop at `max_depth`.
    pub detect_cycles: bool,
    /// Longest parent/nested chain a single resolution may build. Values above
    /// `MAX_DEPTH_CEILING` are treated as the ceiling.
    pub max_depth: usize,
}

impl StoreConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    /// Resolution recurses once per level; deeper chains would exhaust the thread stack.
    pub const MAX_DEPTH_CEILING: usize = 256;

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn detect_cycles(mut self, on: bool) -> Self {
        self.detect_cycles = on;
        self
    }

    /// Clamped to `1..=MAX_DEPTH_CEILING`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, Self::MAX_DEPTH_CEILING);
        self
    }

    pub(crate) fn depth_limit(&self) -> usize {
        self.max_depth.clamp(1, Self::MAX_DEPTH_CEILING)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = StoreConfig::from_json(r#"{"max_depth": 8}"#).unwrap();
        assert!(cfg.detect_cycles);
        assert_eq!(cfg.max_depth, 8);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = StoreConfig::from_json("{detect_cycles").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn zero_depth_is_clamped() {
        let cfg = StoreConfig {
            detect_cycles: false,
            max_depth: 0,
        };
        assert_eq!(cfg.depth_limit(), 1);
        assert_eq!(StoreConfig::default().max_depth(0).max_depth, 1);
    }

    #[test]
    fn large_depth_is_capped() {
        let cfg = StoreConfig::from_json(r#"{"detect_cycles": false, "max_depth": 100000}"#).unwrap();
        assert_eq!(cfg.depth_limit(), StoreConfig::MAX_DEPTH_CEILING);
        assert_eq!(
            StoreConfig::default().max_depth(2000).max_depth,
            StoreConfig::MAX_DEPTH_CEILING
        );
    }
}
