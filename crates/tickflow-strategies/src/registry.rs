//! Validator registry for dynamic construction from configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use tickflow_core::error::ValidatorError;
use tickflow_core::traits::SetupValidator;

use crate::{
    BreakoutConfig, BreakoutValidator, MaAlignmentConfig, MaAlignmentValidator,
};

/// Information about a registered validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Validator name
    pub name: String,
    /// Validator description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry of built-in setup validators.
pub struct ValidatorRegistry {
    validators: HashMap<String, ValidatorInfo>,
}

impl ValidatorRegistry {
    /// Create a registry with all built-in validators.
    pub fn new() -> Self {
        let mut validators = HashMap::new();

        validators.insert(
            "ma_alignment".to_string(),
            ValidatorInfo {
                name: "MA Alignment".to_string(),
                description:
                    "Long entries above aligned daily moving averages on a green, high-volume session"
                        .to_string(),
                default_config: serde_json::to_value(MaAlignmentConfig::default()).unwrap(),
            },
        );

        validators.insert(
            "breakout".to_string(),
            ValidatorInfo {
                name: "Breakout".to_string(),
                description:
                    "Long entries on a break of the previous daily high above a trend filter"
                        .to_string(),
                default_config: serde_json::to_value(BreakoutConfig::default()).unwrap(),
            },
        );

        Self { validators }
    }

    /// All registered validators, sorted by key.
    pub fn list(&self) -> Vec<(&str, &ValidatorInfo)> {
        let mut entries: Vec<(&str, &ValidatorInfo)> = self
            .validators
            .iter()
            .map(|(key, info)| (key.as_str(), info))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Look up a validator by key.
    pub fn get(&self, key: &str) -> Option<&ValidatorInfo> {
        self.validators.get(key)
    }

    /// Construct a validator from its key and a JSON configuration.
    ///
    /// Missing fields fall back to the validator's defaults by merging into
    /// the default config object.
    pub fn build(
        &self,
        key: &str,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn SetupValidator>, ValidatorError> {
        let info = self
            .validators
            .get(key)
            .ok_or_else(|| ValidatorError::NotFound(key.to_string()))?;

        let mut merged = info.default_config.clone();
        if let (Some(base), Some(serde_json::Value::Object(overrides))) =
            (merged.as_object_mut(), config)
        {
            for (field, value) in overrides {
                base.insert(field, value);
            }
        }

        match key {
            "ma_alignment" => {
                let config: MaAlignmentConfig = serde_json::from_value(merged)
                    .map_err(|e| ValidatorError::InvalidConfig(e.to_string()))?;
                Ok(Box::new(MaAlignmentValidator::new(config)?))
            }
            "breakout" => {
                let config: BreakoutConfig = serde_json::from_value(merged)
                    .map_err(|e| ValidatorError::InvalidConfig(e.to_string()))?;
                Ok(Box::new(BreakoutValidator::new(config)?))
            }
            _ => Err(ValidatorError::NotFound(key.to_string())),
        }
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
