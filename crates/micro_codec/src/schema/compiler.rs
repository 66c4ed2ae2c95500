//! # Schema Compiler
//!
//! Turns a [`SchemaDecl`] into a [`CompiledSchema`]:
//!
//! 1. Normalize each property (token, array sugar or object form) into one
//!    shape, expanding shorthand tokens through the type table.
//! 2. Validate per kind and resolve named object schemas.
//! 3. Collapse runs of consecutive booleans into bit groups of at most 8.
//!
//! Compilation is pure. Named references go through a caller-supplied
//! lookup so the compiler never touches the registry directly.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::decl::{truthy, PropertyAttrs, PropertyDecl, SchemaDecl, SchemaRef};
use super::descriptor::{
    ArraySpec, BitGroupSpec, CompiledSchema, EnumSpec, FieldName, Kind, ObjectSpec,
    PropertyDescriptor,
};
use super::types::{self, BaseKind, Shorthand};
use crate::codec::date_millis;
use crate::codec::text::TextEncoding;
use crate::config::SerializerConfig;
use crate::error::{RegistrationError, RegistrationResult};

/// Resolves a registered schema name.
pub type SchemaLookup<'a> = dyn Fn(&str) -> Option<Arc<CompiledSchema>> + 'a;

/// Largest count a one-byte prefix can hold.
const SHORT_PREFIX_MAX: usize = u8::MAX as usize;

/// Largest count a two-byte prefix can hold.
const LARGE_PREFIX_MAX: usize = u16::MAX as usize;

/// Compiles a schema declaration.
pub struct Compiler<'a> {
    config: &'a SerializerConfig,
    lookup: &'a SchemaLookup<'a>,
}

/// One property after shorthand expansion, before validation.
struct Normalized<'d> {
    kind: BaseKind,
    byte_length: Option<usize>,
    unsigned: bool,
    precision: Option<u32>,
    attrs: Option<&'d PropertyAttrs>,
    element: Option<&'d PropertyDecl>,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler with the given limits and reference lookup.
    #[must_use]
    pub fn new(config: &'a SerializerConfig, lookup: &'a SchemaLookup<'a>) -> Self {
        Self { config, lookup }
    }

    /// Compiles every field, then collapses boolean runs.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn compile(&self, decl: &SchemaDecl) -> RegistrationResult<CompiledSchema> {
        self.compile_at(decl, "")
    }

    fn compile_at(&self, decl: &SchemaDecl, path: &str) -> RegistrationResult<CompiledSchema> {
        let mut fields = Vec::with_capacity(decl.len());
        for (key, property) in decl.fields() {
            let field_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            fields.push(self.compile_property(FieldName::Key(key.clone()), property, &field_path)?);
        }
        Ok(CompiledSchema::new(collapse_booleans(fields)))
    }

    fn compile_property(
        &self,
        name: FieldName,
        property: &PropertyDecl,
        field: &str,
    ) -> RegistrationResult<PropertyDescriptor> {
        let normalized = normalize(property, field)?;
        let attrs = normalized.attrs;
        let default_value = attrs
            .and_then(|a| a.default_value.clone())
            .unwrap_or(Value::Null);

        let (kind, byte_length) = match normalized.kind {
            BaseKind::Int => {
                let width = number_width(normalized.byte_length.unwrap_or(4), field)?;
                check_number_default(&default_value, field)?;
                (Kind::Int { unsigned: normalized.unsigned }, Some(width))
            }
            BaseKind::Float => {
                let width = number_width(normalized.byte_length.unwrap_or(8), field)?;
                check_number_default(&default_value, field)?;
                let kind = Kind::Float {
                    unsigned: normalized.unsigned,
                    precision: normalized.precision.unwrap_or(0),
                };
                (kind, Some(width))
            }
            BaseKind::Boolean => (Kind::Boolean, Some(1)),
            BaseKind::String => {
                let encoding = match attrs.and_then(|a| a.encoding.as_deref()) {
                    None => TextEncoding::Utf8,
                    Some(name) => TextEncoding::from_name(name).ok_or_else(|| {
                        RegistrationError::UnknownEncoding {
                            field: field.to_string(),
                            encoding: name.to_string(),
                        }
                    })?,
                };
                if !matches!(default_value, Value::Null | Value::String(_)) {
                    return Err(invalid_default(field, "expected a string"));
                }
                let large = attrs.is_some_and(|a| a.large);
                (Kind::String { encoding, large }, normalized.byte_length)
            }
            BaseKind::Array => {
                let spec = self.compile_array(&normalized, field)?;
                if !matches!(default_value, Value::Null | Value::Array(_)) {
                    return Err(invalid_default(field, "expected an array"));
                }
                (Kind::Array(spec), normalized.byte_length)
            }
            BaseKind::Object => {
                let spec = self.compile_object(attrs, normalized.byte_length, field)?;
                if !matches!(default_value, Value::Null | Value::Object(_)) {
                    return Err(invalid_default(field, "expected an object"));
                }
                (Kind::Object(spec), normalized.byte_length)
            }
            BaseKind::Enum => (Kind::Enum(compile_enum(attrs, &default_value, field)?), Some(1)),
            BaseKind::Date => {
                if !default_value.is_null() && date_millis(&default_value).is_none() {
                    return Err(invalid_default(field, "expected epoch milliseconds or a date string"));
                }
                (Kind::Date, Some(8))
            }
        };

        Ok(PropertyDescriptor {
            name,
            kind,
            byte_length,
            default_value,
        })
    }

    fn compile_array(&self, normalized: &Normalized<'_>, field: &str) -> RegistrationResult<ArraySpec> {
        let element_decl = normalized.element.ok_or_else(|| RegistrationError::MissingElement {
            field: field.to_string(),
        })?;
        let element = self.compile_property(FieldName::Index(0), element_decl, &format!("{field}[]"))?;
        let attrs = normalized.attrs;
        let large = attrs.is_some_and(|a| a.large);
        let explicit_max = attrs.and_then(|a| a.max_length);

        let element_width = element.byte_length.filter(|w| *w > 0);

        let max_length = match normalized.byte_length {
            Some(byte_length) => {
                let element_length = element_width.unwrap_or(1);
                if byte_length % element_length != 0 {
                    return Err(RegistrationError::IndivisibleArrayLength {
                        field: field.to_string(),
                        byte_length,
                        element_length,
                    });
                }
                explicit_max.unwrap_or(byte_length / element_length)
            }
            None => {
                let cap = if large { LARGE_PREFIX_MAX } else { SHORT_PREFIX_MAX };
                explicit_max
                    .unwrap_or_else(|| self.config.max_buffer_length / element_width.unwrap_or(2))
                    .min(cap)
            }
        };

        Ok(ArraySpec {
            element: Box::new(element),
            max_length,
            large,
        })
    }

    fn compile_object(
        &self,
        attrs: Option<&PropertyAttrs>,
        byte_length: Option<usize>,
        field: &str,
    ) -> RegistrationResult<ObjectSpec> {
        let allow_null = attrs.is_some_and(|a| a.allow_null);
        if allow_null && byte_length.is_some() {
            return Err(RegistrationError::NullableFixedObject {
                field: field.to_string(),
            });
        }

        let (schema, reference) = match attrs.and_then(|a| a.schema.as_ref()) {
            None => {
                return Err(RegistrationError::MissingSchema {
                    field: field.to_string(),
                })
            }
            Some(SchemaRef::Inline(inner)) => (Arc::new(self.compile_at(inner, field)?), None),
            Some(SchemaRef::Named(reference)) => {
                let schema = (self.lookup)(reference).ok_or_else(|| {
                    RegistrationError::UnregisteredSchema {
                        field: field.to_string(),
                        reference: reference.clone(),
                    }
                })?;
                (schema, Some(reference.clone()))
            }
        };

        Ok(ObjectSpec {
            schema,
            reference,
            allow_null,
        })
    }
}

fn normalize<'d>(property: &'d PropertyDecl, field: &str) -> RegistrationResult<Normalized<'d>> {
    let unknown = |token: &str| RegistrationError::UnknownType {
        field: field.to_string(),
        token: token.to_string(),
    };

    match property {
        PropertyDecl::Token(token) => {
            let shorthand = types::resolve_token(token).ok_or_else(|| unknown(token))?;
            Ok(from_shorthand(shorthand, None, None))
        }
        PropertyDecl::Array(element) => Ok(Normalized {
            kind: BaseKind::Array,
            byte_length: None,
            unsigned: false,
            precision: None,
            attrs: None,
            element: Some(element.as_ref()),
        }),
        PropertyDecl::Object(attrs) => {
            let shorthand = BaseKind::from_name(&attrs.type_name)
                .map(Shorthand::bare)
                .or_else(|| types::lookup(&attrs.type_name))
                .ok_or_else(|| unknown(&attrs.type_name))?;
            let mut normalized = from_shorthand(shorthand, Some(attrs), attrs.element.as_deref());
            if let Some(width) = attrs.byte_length.filter(|w| *w > 0) {
                normalized.byte_length = Some(width);
            }
            if let Some(unsigned) = attrs.unsigned {
                normalized.unsigned = unsigned;
            }
            if attrs.precision.is_some() {
                normalized.precision = attrs.precision;
            }
            Ok(normalized)
        }
    }
}

fn from_shorthand<'d>(
    shorthand: Shorthand,
    attrs: Option<&'d PropertyAttrs>,
    element: Option<&'d PropertyDecl>,
) -> Normalized<'d> {
    Normalized {
        kind: shorthand.kind,
        byte_length: shorthand.byte_length,
        unsigned: shorthand.unsigned,
        precision: shorthand.precision,
        attrs,
        element,
    }
}

fn compile_enum(
    attrs: Option<&PropertyAttrs>,
    default_value: &Value,
    field: &str,
) -> RegistrationResult<EnumSpec> {
    let declared = attrs.map(|a| a.values.as_slice()).unwrap_or_default();
    if declared.is_empty() {
        return Err(RegistrationError::EmptyEnum {
            field: field.to_string(),
        });
    }

    let default = match default_value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err(invalid_default(field, "enum default must be a string")),
    };

    let mut values: Vec<Option<String>> = declared.iter().cloned().map(Some).collect();
    let default_index = match values.iter().position(|v| *v == default) {
        Some(index) => index,
        None => {
            values.push(default);
            values.len() - 1
        }
    };

    if values.len() > SHORT_PREFIX_MAX + 1 {
        return Err(RegistrationError::TooManyEnumValues {
            field: field.to_string(),
            count: values.len(),
        });
    }

    Ok(EnumSpec {
        values,
        default_index,
    })
}

/// Merges consecutive top-level booleans into bit groups of at most 8.
fn collapse_booleans(fields: Vec<PropertyDescriptor>) -> Vec<PropertyDescriptor> {
    let mut out: Vec<PropertyDescriptor> = Vec::with_capacity(fields.len());
    let mut open_group = false;

    for descriptor in fields {
        if descriptor.kind != Kind::Boolean {
            open_group = false;
            out.push(descriptor);
            continue;
        }

        let key = descriptor.key().to_string();
        let default = truthy(&descriptor.default_value);
        if open_group {
            if let Some(Kind::BitGroup(group)) = out.last_mut().map(|d| &mut d.kind) {
                if group.names.len() < BitGroupSpec::CAPACITY {
                    group.names.push(key);
                    group.defaults.push(default);
                    continue;
                }
            }
        }

        open_group = true;
        out.push(PropertyDescriptor {
            name: FieldName::Key(key.clone()),
            kind: Kind::BitGroup(BitGroupSpec {
                names: vec![key],
                defaults: vec![default],
            }),
            byte_length: Some(1),
            default_value: Value::Null,
        });
    }

    out
}

/// Worst-case encoded size of a schema, before clamping.
#[must_use]
pub fn estimate_size(schema: &CompiledSchema, config: &SerializerConfig) -> usize {
    schema
        .iter()
        .map(|descriptor| descriptor_size(descriptor, config))
        .fold(0usize, usize::saturating_add)
}

fn descriptor_size(descriptor: &PropertyDescriptor, config: &SerializerConfig) -> usize {
    if let Some(byte_length) = descriptor.byte_length {
        return byte_length;
    }
    match &descriptor.kind {
        Kind::Object(spec) => {
            usize::from(spec.allow_null).saturating_add(estimate_size(&spec.schema, config))
        }
        Kind::String { large: true, .. } | Kind::Array(ArraySpec { large: true, .. }) => {
            config.large_field_estimate
        }
        _ => config.variable_field_estimate,
    }
}

/// Size estimate clamped to the configured buffer ceiling.
#[must_use]
pub fn max_encoded_size(schema: &CompiledSchema, config: &SerializerConfig) -> usize {
    let estimate = estimate_size(schema, config);
    if estimate > config.max_buffer_length {
        warn!(
            estimate,
            max_buffer_length = config.max_buffer_length,
            "Schema size estimate exceeds the buffer ceiling, clamping"
        );
        return config.max_buffer_length;
    }
    estimate
}

fn number_width(byte_length: usize, field: &str) -> RegistrationResult<usize> {
    if matches!(byte_length, 1 | 2 | 4 | 8) {
        Ok(byte_length)
    } else {
        Err(RegistrationError::InvalidByteLength {
            field: field.to_string(),
            byte_length,
        })
    }
}

fn check_number_default(value: &Value, field: &str) -> RegistrationResult<()> {
    match value {
        Value::Null | Value::Number(_) => Ok(()),
        _ => Err(invalid_default(field, "expected a number")),
    }
}

fn invalid_default(field: &str, reason: &str) -> RegistrationError {
    RegistrationError::InvalidDefault {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
