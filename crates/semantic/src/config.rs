// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use serde::{Deserialize, Serialize};

/// Analyzer settings
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Deepest node nesting the finalize walk accepts
    pub max_depth: usize,
    /// Prefix of generated column aliases (`K0`, `K1`, ...)
    pub alias_prefix: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            alias_prefix: "K".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Builder method: set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnalyzerConfig = serde_json::from_str(r#"{"max_depth": 16}"#).unwrap();
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.alias_prefix, "K");
    }
}
