//! # Serializer Configuration
//!
//! Registry-wide limits, loaded once at startup.
//!
//! ```toml
//! max_buffer_length = 1200
//! variable_field_estimate = 256
//! large_field_estimate = 65536
//! serialize_type = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{DEFAULT_MAX_BUFFER_LENGTH, LARGE_FIELD_ESTIMATE, VARIABLE_FIELD_ESTIMATE};

/// Registry-wide serializer limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Ceiling for any single encoded payload, and for size estimates.
    pub max_buffer_length: usize,
    /// Size estimate for a variable-length field.
    pub variable_field_estimate: usize,
    /// Size estimate for a variable-length field marked `large`.
    pub large_field_estimate: usize,
    /// Whether schemas embed their type id unless told otherwise.
    pub serialize_type: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: DEFAULT_MAX_BUFFER_LENGTH,
            variable_field_estimate: VARIABLE_FIELD_ESTIMATE,
            large_field_estimate: LARGE_FIELD_ESTIMATE,
            serialize_type: true,
        }
    }
}

impl SerializerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or a limit is zero.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns error if any limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_buffer_length == 0 {
            return Err(ConfigError::Invalid(
                "max_buffer_length must be greater than 0".to_string(),
            ));
        }
        if self.variable_field_estimate == 0 || self.large_field_estimate == 0 {
            return Err(ConfigError::Invalid(
                "field size estimates must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = SerializerConfig::default();
        assert_eq!(config.max_buffer_length, 1024);
        assert_eq!(config.variable_field_estimate, 256);
        assert_eq!(config.large_field_estimate, 65536);
        assert!(config.serialize_type);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SerializerConfig::from_toml_str("max_buffer_length = 1200\n").unwrap();
        assert_eq!(config.max_buffer_length, 1200);
        assert_eq!(config.variable_field_estimate, 256);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = SerializerConfig::from_toml_str("max_buffer_length = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = SerializerConfig::from_toml_str("max_buffer_length = \"big\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
