//! # Codec Error Types
//!
//! Two channels, on purpose:
//!
//! - [`RegistrationError`]: schema problems. Fail fast, nothing is installed.
//! - [`CodecError`]: call-time problems. Limited to "which schema is this?";
//!   malformed or short data never produces an error, only partial output.

use thiserror::Error;

/// Errors raised while compiling or registering a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Wraps an error with the name of the schema being registered.
    #[error("unable to register schema '{name}': {source}")]
    Schema {
        /// Schema name passed to `register`.
        name: String,
        /// Underlying failure.
        #[source]
        source: Box<RegistrationError>,
    },

    /// The declaration for a field has the wrong shape.
    #[error("field '{field}': {reason}")]
    MalformedProperty {
        /// Field path.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The `type` of a field is not a known kind or shorthand token.
    #[error("field '{field}': invalid schema property type '{token}'")]
    UnknownType {
        /// Field path.
        field: String,
        /// The offending token.
        token: String,
    },

    /// Numeric fields must be 1, 2, 4 or 8 bytes wide.
    #[error("field '{field}': invalid byteLength {byte_length} for a number (must be 1, 2, 4 or 8)")]
    InvalidByteLength {
        /// Field path.
        field: String,
        /// Declared width.
        byte_length: usize,
    },

    /// A fixed array width is not a multiple of its element width.
    #[error("field '{field}': array byteLength {byte_length} is not a multiple of its element's byteLength {element_length}")]
    IndivisibleArrayLength {
        /// Field path.
        field: String,
        /// Declared array width.
        byte_length: usize,
        /// Element width.
        element_length: usize,
    },

    /// Array declared without an `element`.
    #[error("field '{field}': an 'array' property requires an 'element'")]
    MissingElement {
        /// Field path.
        field: String,
    },

    /// Object declared without a `schema`.
    #[error("field '{field}': an 'object' property requires a 'schema' (inline or by name)")]
    MissingSchema {
        /// Field path.
        field: String,
    },

    /// Object references a schema name that has not been registered.
    #[error("field '{field}': could not find a registered schema '{reference}'")]
    UnregisteredSchema {
        /// Field path.
        field: String,
        /// Referenced schema name.
        reference: String,
    },

    /// `allowNull` and a fixed `byteLength` on the same object.
    #[error("field '{field}': 'allowNull' cannot be combined with a fixed 'byteLength'")]
    NullableFixedObject {
        /// Field path.
        field: String,
    },

    /// Enum declared without values.
    #[error("field '{field}': an 'enum' property requires a non-empty 'values' list")]
    EmptyEnum {
        /// Field path.
        field: String,
    },

    /// Enum indices are stored in one byte.
    #[error("field '{field}': enum has {count} values, at most 256 fit in one byte")]
    TooManyEnumValues {
        /// Field path.
        field: String,
        /// Value count including the default.
        count: usize,
    },

    /// Unsupported string encoding name.
    #[error("field '{field}': unknown string encoding '{encoding}'")]
    UnknownEncoding {
        /// Field path.
        field: String,
        /// The encoding name.
        encoding: String,
    },

    /// A declared `defaultValue` cannot be represented by the field.
    #[error("field '{field}': invalid default value: {reason}")]
    InvalidDefault {
        /// Field path.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Type ids must fit in one byte.
    #[error("invalid typeId {0} (must be an integer between 0-255)")]
    TypeIdOutOfRange(u32),

    /// Another embedding schema already owns this type id.
    #[error("typeId {type_id} is already used by schema '{owner}'")]
    TypeIdInUse {
        /// The contested id.
        type_id: u8,
        /// Current owner.
        owner: String,
    },

    /// All 256 type ids are taken.
    #[error("no free typeId left (all 256 are registered)")]
    TypeIdsExhausted,

    /// Batch entries whose references never resolved (missing or cyclic).
    #[error("unresolved schema references in batch: {0:?}")]
    UnresolvedReferences(Vec<String>),

    /// A schema catalogue document could not be parsed.
    #[error("invalid schema catalogue: {0}")]
    InvalidCatalog(String),
}

impl RegistrationError {
    /// Attaches the schema name to an error.
    #[must_use]
    pub fn in_schema(self, name: &str) -> Self {
        match self {
            already @ Self::Schema { .. } => already,
            other => Self::Schema {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, skipping schema-name wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Schema { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors raised by encode/decode calls.
#[derive(Error, Debug)]
pub enum CodecError {
    /// No schema registered under this name.
    #[error("no schema with name '{0}' has been registered")]
    UnknownSchema(String),

    /// The leading type id does not belong to any embedding schema.
    #[error("could not derive a registered schema from typeId {0}")]
    UnknownTypeId(u8),

    /// Self-describing decode on an empty buffer.
    #[error("buffer is empty, no typeId to read")]
    MissingTypeId,

    /// Named decode whose leading type id belongs to another schema.
    #[error("schema '{schema}' expects typeId {expected}, buffer starts with {found}")]
    TypeMismatch {
        /// Requested schema.
        schema: String,
        /// Its type id.
        expected: u8,
        /// Byte found in the buffer.
        found: u8,
    },

    /// Conversion between a typed value and JSON failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("unable to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document is malformed.
    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for schema registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type for encode/decode calls.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_schema_wraps_once() {
        let err = RegistrationError::MissingElement { field: "a".into() }
            .in_schema("Inner")
            .in_schema("Outer");

        match &err {
            RegistrationError::Schema { name, .. } => assert_eq!(name, "Inner"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            err.root_cause(),
            &RegistrationError::MissingElement { field: "a".into() }
        );
    }

    #[test]
    fn test_messages_name_the_field() {
        let err = RegistrationError::IndivisibleArrayLength {
            field: "badArray".into(),
            byte_length: 3,
            element_length: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("badArray"));
        assert!(msg.contains('3'));
    }
}
