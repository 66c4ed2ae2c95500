//! # Compiled Descriptors
//!
//! The compiler turns every declaration into a [`PropertyDescriptor`]. The
//! encoder and decoder only ever see these.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::text::TextEncoding;

/// Key of a field, or slot index of an array element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// Object key.
    Key(String),
    /// Array slot.
    Index(usize),
}

impl FieldName {
    /// The object key, if this is one.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Compiled metadata for one field.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// Field key or element index.
    pub name: FieldName,
    /// Kind and kind-specific settings.
    pub kind: Kind,
    /// Fixed encoded width; `None` means length-prefixed.
    pub byte_length: Option<usize>,
    /// Substituted when the data omits the field or holds null.
    pub default_value: Value,
}

/// Kind of a compiled field.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// Fixed-width integer.
    Int {
        /// Unsigned encoding.
        unsigned: bool,
    },
    /// Number scaled by `10^precision` and stored as an integer, or a raw
    /// `f64` when eight bytes wide.
    Float {
        /// Unsigned encoding.
        unsigned: bool,
        /// Decimal digits kept.
        precision: u32,
    },
    /// Single boolean stored as one byte. Only array elements keep this kind.
    Boolean,
    /// Text.
    String {
        /// Byte encoding of the text.
        encoding: TextEncoding,
        /// Two-byte length prefix.
        large: bool,
    },
    /// Homogeneous list.
    Array(ArraySpec),
    /// Nested schema.
    Object(ObjectSpec),
    /// One-byte index into `values`.
    Enum(EnumSpec),
    /// Milliseconds since the Unix epoch as an `f64`.
    Date,
    /// Up to eight consecutive booleans in one byte.
    BitGroup(BitGroupSpec),
}

/// Array settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySpec {
    /// Descriptor shared by every slot.
    pub element: Box<PropertyDescriptor>,
    /// Slot cap.
    pub max_length: usize,
    /// Two-byte count prefix.
    pub large: bool,
}

/// Object settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSpec {
    /// Nested schema, compiled inline or resolved by name at registration.
    pub schema: Arc<CompiledSchema>,
    /// Registered name the schema was resolved from.
    pub reference: Option<String>,
    /// One leading presence byte.
    pub allow_null: bool,
}

/// Enum settings.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSpec {
    /// Legal values; `None` is the null slot.
    pub values: Vec<Option<String>>,
    /// Index written for unknown values and read for out-of-range bytes.
    pub default_index: usize,
}

impl EnumSpec {
    /// Index of `value`, or the default index.
    #[must_use]
    pub fn index_of(&self, value: Option<&str>) -> usize {
        self.values
            .iter()
            .position(|v| v.as_deref() == value)
            .unwrap_or(self.default_index)
    }

    /// Value stored at `index`, falling back to the default slot.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values
            .get(index)
            .or_else(|| self.values.get(self.default_index))
            .and_then(Option::as_deref)
    }
}

/// Bit-packed boolean run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitGroupSpec {
    /// Field names, most significant bit first.
    pub names: Vec<String>,
    /// Per-field defaults.
    pub defaults: Vec<bool>,
}

impl BitGroupSpec {
    /// Most booleans one byte can hold.
    pub const CAPACITY: usize = 8;

    /// Mask of the bit for slot `index`.
    #[must_use]
    pub const fn mask(index: usize) -> u8 {
        0x80 >> index
    }
}

impl PropertyDescriptor {
    /// Field key; empty for array elements.
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.as_key().unwrap_or_default()
    }

    /// True if the field always occupies `byte_length` bytes.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.byte_length.is_some()
    }

    /// True if the field never writes a byte: a non-nullable, unsized
    /// object whose fields are all zero-width themselves.
    #[must_use]
    pub fn is_zero_width(&self) -> bool {
        match &self.kind {
            Kind::Object(spec) if !self.is_fixed() && !spec.allow_null => {
                spec.schema.iter().all(Self::is_zero_width)
            }
            _ => false,
        }
    }
}

/// Ordered, immutable sequence of descriptors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledSchema {
    fields: Vec<PropertyDescriptor>,
}

impl CompiledSchema {
    /// Wraps compiled descriptors.
    #[must_use]
    pub fn new(fields: Vec<PropertyDescriptor>) -> Self {
        Self { fields }
    }

    /// Descriptors in wire order.
    #[must_use]
    pub fn fields(&self) -> &[PropertyDescriptor] {
        &self.fields
    }

    /// Iterates over descriptors in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertyDescriptor> {
        self.fields.iter()
    }

    /// Number of descriptors (a bit group counts once).
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a descriptor by key, including names inside bit groups.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.fields.iter().find(|d| match &d.kind {
            Kind::BitGroup(group) => group.names.iter().any(|n| n == key),
            _ => d.name.as_key() == Some(key),
        })
    }
}

impl<'a> IntoIterator for &'a CompiledSchema {
    type Item = &'a PropertyDescriptor;
    type IntoIter = std::slice::Iter<'a, PropertyDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> EnumSpec {
        EnumSpec {
            values: vec![Some("red".into()), Some("green".into()), None],
            default_index: 2,
        }
    }

    #[test]
    fn test_enum_index_falls_back_to_default() {
        let spec = colors();
        assert_eq!(spec.index_of(Some("green")), 1);
        assert_eq!(spec.index_of(Some("purple")), 2);
        assert_eq!(spec.index_of(None), 2);
    }

    #[test]
    fn test_enum_value_out_of_range() {
        let spec = colors();
        assert_eq!(spec.value_at(0), Some("red"));
        assert_eq!(spec.value_at(2), None);
        assert_eq!(spec.value_at(200), None);
    }

    #[test]
    fn test_bit_masks_are_msb_first() {
        assert_eq!(BitGroupSpec::mask(0), 0b1000_0000);
        assert_eq!(BitGroupSpec::mask(7), 0b0000_0001);
    }

    #[test]
    fn test_field_lookup_sees_bit_group_members() {
        let schema = CompiledSchema::new(vec![PropertyDescriptor {
            name: FieldName::Key("a".into()),
            kind: Kind::BitGroup(BitGroupSpec {
                names: vec!["a".into(), "b".into()],
                defaults: vec![false, false],
            }),
            byte_length: Some(1),
            default_value: Value::Null,
        }]);
        assert!(schema.field("b").is_some());
        assert!(schema.field("c").is_none());
    }

    #[test]
    fn test_field_name_display() {
        assert_eq!(FieldName::Key("speed".into()).to_string(), "speed");
        assert_eq!(FieldName::Index(3).to_string(), "[3]");
    }
}
