//! # MICRO Codec
//!
//! Schema-driven binary serialization. A schema names each field's type;
//! the codec writes the fields back to back with no keys, no tags and no
//! padding beyond what fixed-width slots ask for.
//!
//! ## Design Principles
//!
//! 1. **Density first** - precision-scaled floats, bit-packed booleans, one-byte prefixes
//! 2. **Fail fast at registration** - every schema problem is a `RegistrationError`
//! 3. **Lenient at call time** - missing fields take defaults, short buffers give partial objects
//! 4. **Prefix friendly** - any byte budget yields a decodable prefix of the fields
//!
//! ## Example
//!
//! ```rust
//! use micro_codec::{RegisterOptions, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register_value("Person", &json!({"name": "string", "age": "uint8"}), RegisterOptions::default())
//!     .unwrap();
//!
//! let bytes = registry.to_binary(&json!({"name": "Al", "age": 30}), "Person", None).unwrap();
//! assert_eq!(bytes, vec![0, 2, b'A', b'l', 30]);
//!
//! let back = registry.to_json(&bytes, None).unwrap();
//! assert_eq!(back, json!({"name": "Al", "age": 30, "_type": "Person"}));
//! ```
//!
//! ## Thread Safety
//!
//! [`Registry`] is a plain value: registration takes `&mut self`, encoding
//! and decoding take `&self`. Use [`SharedRegistry`] to share one between
//! threads.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod config;
pub mod error;
pub mod registry;
pub mod schema;

pub use codec::TextEncoding;
pub use config::SerializerConfig;
pub use error::{CodecError, CodecResult, ConfigError, RegistrationError, RegistrationResult};
pub use registry::{RegisterOptions, Registry, RegistryEntry, SharedRegistry};
pub use schema::{
    CompiledSchema, FieldName, Kind, PropertyAttrs, PropertyDecl, PropertyDescriptor, SchemaDecl,
    SchemaRef,
};

/// Default ceiling for a single payload.
pub const DEFAULT_MAX_BUFFER_LENGTH: usize = 1024;

/// Size estimate for a length-prefixed field.
pub const VARIABLE_FIELD_ESTIMATE: usize = 256;

/// Size estimate for a length-prefixed field marked `large`.
pub const LARGE_FIELD_ESTIMATE: usize = 65536;

/// Key holding the schema name in self-describing decodes.
pub const TYPE_KEY: &str = "_type";
