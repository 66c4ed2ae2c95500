//! # Schema Declarations
//!
//! The uncompiled, caller-facing side of a schema. A declaration is an
//! ordered list of `(field, PropertyDecl)` pairs; order is the wire order.
//!
//! Three property forms are accepted, in code or in JSON/TOML:
//!
//! ```text
//! "uint8"                                   PropertyDecl::Token
//! ["short"]                                 PropertyDecl::Array  (sugar for { type: "array", element })
//! { "type": "float", "byteLength": 2, ... } PropertyDecl::Object
//! ```
//!
//! Declarations are only checked for shape here. Semantic validation
//! (widths, references, enum values) happens in the compiler.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{RegistrationError, RegistrationResult};

/// Ordered field declarations of one schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaDecl {
    fields: Vec<(String, PropertyDecl)>,
}

/// Declaration of a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyDecl {
    /// Shorthand token such as `"uint16"` or `"string"`.
    Token(String),
    /// Array sugar `[element]`.
    Array(Box<PropertyDecl>),
    /// Full property object.
    Object(Box<PropertyAttrs>),
}

/// Nested schema of an object property.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaRef {
    /// Compiled together with the parent.
    Inline(SchemaDecl),
    /// Resolved from the registry when the parent is registered.
    Named(String),
}

/// Attributes of the object form `{ type, ...modifiers }`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyAttrs {
    /// Kind name or shorthand token.
    pub type_name: String,
    /// Fixed encoded width.
    pub byte_length: Option<usize>,
    /// Unsigned numeric encoding.
    pub unsigned: Option<bool>,
    /// Decimal digits kept by a float.
    pub precision: Option<u32>,
    /// String encoding name.
    pub encoding: Option<String>,
    /// Value used when the data omits the field.
    pub default_value: Option<Value>,
    /// Object may be null (one presence byte).
    pub allow_null: bool,
    /// Two-byte length/count prefix.
    pub large: bool,
    /// Array element declaration.
    pub element: Option<Box<PropertyDecl>>,
    /// Object schema.
    pub schema: Option<SchemaRef>,
    /// Enum values.
    pub values: Vec<String>,
    /// Array slot cap.
    pub max_length: Option<usize>,
}

impl SchemaDecl {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, builder style.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, property: impl Into<PropertyDecl>) -> Self {
        self.push(name, property);
        self
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, property: impl Into<PropertyDecl>) {
        self.fields.push((name.into(), property.into()));
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(String, PropertyDecl)] {
        &self.fields
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of registered schemas this declaration refers to, at any depth.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (_, property) in &self.fields {
            property.collect_references(&mut names);
        }
        names
    }

    /// Parses a JSON object `{ field: property, ... }`.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object or a property is malformed.
    pub fn from_value(value: &Value) -> RegistrationResult<Self> {
        parse_schema(value, "")
    }

    /// Parses JSON text.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON or not a valid schema.
    pub fn from_json_str(text: &str) -> RegistrationResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RegistrationError::InvalidCatalog(e.to_string()))?;
        Self::from_value(&value)
    }
}

impl<N, P> FromIterator<(N, P)> for SchemaDecl
where
    N: Into<String>,
    P: Into<PropertyDecl>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut decl = Self::new();
        for (name, property) in iter {
            decl.push(name, property);
        }
        decl
    }
}

impl<'de> Deserialize<'de> for SchemaDecl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl PropertyDecl {
    /// Array sugar `[element]`.
    #[must_use]
    pub fn array(element: impl Into<PropertyDecl>) -> Self {
        Self::Array(Box::new(element.into()))
    }

    /// Object property referring to a registered schema.
    #[must_use]
    pub fn object_ref(name: impl Into<String>) -> Self {
        PropertyAttrs::new("object").with_schema(SchemaRef::Named(name.into())).into()
    }

    /// Object property with an inline schema.
    #[must_use]
    pub fn object(schema: SchemaDecl) -> Self {
        PropertyAttrs::new("object").with_schema(SchemaRef::Inline(schema)).into()
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        match self {
            Self::Token(_) => {}
            Self::Array(element) => element.collect_references(names),
            Self::Object(attrs) => {
                if let Some(element) = &attrs.element {
                    element.collect_references(names);
                }
                match &attrs.schema {
                    Some(SchemaRef::Named(name)) => {
                        if !names.contains(name) {
                            names.push(name.clone());
                        }
                    }
                    Some(SchemaRef::Inline(inner)) => {
                        for name in inner.references() {
                            if !names.contains(&name) {
                                names.push(name);
                            }
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

impl From<&str> for PropertyDecl {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl From<String> for PropertyDecl {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl From<PropertyAttrs> for PropertyDecl {
    fn from(attrs: PropertyAttrs) -> Self {
        Self::Object(Box::new(attrs))
    }
}

impl PropertyAttrs {
    /// Starts an object-form declaration.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Sets a fixed width.
    #[must_use]
    pub fn with_byte_length(mut self, byte_length: usize) -> Self {
        self.byte_length = Some(byte_length);
        self
    }

    /// Marks the number as unsigned.
    #[must_use]
    pub fn with_unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = Some(unsigned);
        self
    }

    /// Sets float precision.
    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the string encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Allows a null object.
    #[must_use]
    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Uses a two-byte prefix.
    #[must_use]
    pub fn with_large(mut self, large: bool) -> Self {
        self.large = large;
        self
    }

    /// Sets the array element.
    #[must_use]
    pub fn with_element(mut self, element: impl Into<PropertyDecl>) -> Self {
        self.element = Some(Box::new(element.into()));
        self
    }

    /// Sets the object schema.
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the enum values.
    #[must_use]
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Caps the number of array slots.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Parses a `{ name: schema, ... }` catalogue.
///
/// # Errors
///
/// Returns error if the document is not an object of schema objects.
pub fn parse_catalog(value: &Value) -> RegistrationResult<Vec<(String, SchemaDecl)>> {
    let Value::Object(entries) = value else {
        return Err(RegistrationError::InvalidCatalog(
            "a catalogue must be an object of named schemas".to_string(),
        ));
    };

    entries
        .iter()
        .map(|(name, schema)| {
            parse_schema(schema, "")
                .map(|decl| (name.clone(), decl))
                .map_err(|e| e.in_schema(name))
        })
        .collect()
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn parse_schema(value: &Value, path: &str) -> RegistrationResult<SchemaDecl> {
    let Value::Object(map) = value else {
        return Err(RegistrationError::MalformedProperty {
            field: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            reason: "schema must be an object".to_string(),
        });
    };

    let mut decl = SchemaDecl::new();
    for (key, property) in map {
        let field = join(path, key);
        decl.push(key.clone(), parse_property(property, &field)?);
    }
    Ok(decl)
}

fn parse_property(value: &Value, field: &str) -> RegistrationResult<PropertyDecl> {
    match value {
        Value::String(token) => Ok(PropertyDecl::Token(token.clone())),
        Value::Array(items) => match items.first() {
            Some(element) => Ok(PropertyDecl::array(parse_property(element, field)?)),
            None => Err(malformed(field, "array sugar needs an element, e.g. [\"uint8\"]")),
        },
        Value::Object(map) => parse_attrs(map, field).map(PropertyDecl::from),
        _ => Err(malformed(field, "schema property must be either string or object")),
    }
}

fn parse_attrs(map: &Map<String, Value>, field: &str) -> RegistrationResult<PropertyAttrs> {
    let type_name = match map.get("type") {
        Some(Value::String(name)) => name.clone(),
        Some(_) => return Err(malformed(field, "'type' must be a string")),
        None => return Err(malformed(field, "no 'type' specified for schema property")),
    };

    let mut attrs = PropertyAttrs::new(type_name);
    // A zero width means length-prefixed.
    attrs.byte_length = read_usize(map, "byteLength", field)?.filter(|n| *n > 0);
    attrs.max_length = read_usize(map, "maxLength", field)?;
    attrs.precision = read_usize(map, "precision", field)?
        .map(|p| u32::try_from(p).map_err(|_| malformed(field, "'precision' is too large")))
        .transpose()?;
    attrs.unsigned = map.get("unsigned").map(truthy);
    attrs.allow_null = map.get("allowNull").is_some_and(truthy);
    attrs.large = map.get("large").is_some_and(truthy);
    attrs.default_value = map.get("defaultValue").cloned();

    attrs.encoding = match map.get("encoding") {
        Some(Value::String(encoding)) => Some(encoding.clone()),
        Some(_) => return Err(malformed(field, "'encoding' must be a string")),
        None => None,
    };

    if let Some(element) = map.get("element") {
        attrs.element = Some(Box::new(parse_property(element, field)?));
    }

    attrs.schema = match map.get("schema") {
        Some(Value::String(name)) => Some(SchemaRef::Named(name.clone())),
        Some(inline @ Value::Object(_)) => Some(SchemaRef::Inline(parse_schema(inline, field)?)),
        Some(_) => {
            return Err(malformed(field, "'schema' must be a schema name or an inline schema object"))
        }
        None => None,
    };

    if let Some(values) = map.get("values") {
        let Value::Array(items) = values else {
            return Err(malformed(field, "'values' must be a list of strings"));
        };
        attrs.values = items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(malformed(field, "'values' must be a list of strings")),
            })
            .collect::<RegistrationResult<_>>()?;
    }

    Ok(attrs)
}

fn read_usize(map: &Map<String, Value>, key: &str, field: &str) -> RegistrationResult<Option<usize>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| malformed(field, &format!("'{key}' must be a non-negative integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| malformed(field, &format!("'{key}' must be a non-negative integer"))),
        Some(_) => Err(malformed(field, &format!("'{key}' must be a non-negative integer"))),
    }
}

/// JSON truthiness, used for flags and boolean data.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn malformed(field: &str, reason: &str) -> RegistrationError {
    RegistrationError::MalformedProperty {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
