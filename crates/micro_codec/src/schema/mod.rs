//! # Schemas
//!
//! Declarations, the type table, and the compiler that turns one into the
//! descriptors the codec walks.

pub mod compiler;
pub mod decl;
pub mod descriptor;
pub mod types;

pub use compiler::{estimate_size, max_encoded_size, Compiler, SchemaLookup};
pub use decl::{parse_catalog, PropertyAttrs, PropertyDecl, SchemaDecl, SchemaRef};
pub use descriptor::{
    ArraySpec, BitGroupSpec, CompiledSchema, EnumSpec, FieldName, Kind, ObjectSpec,
    PropertyDescriptor,
};
pub use types::{BaseKind, Shorthand};
