//! # Type Table
//!
//! Fixed mapping from shorthand type tokens to canonical property shapes.
//!
//! ```text
//! "uint8"   -> Int    { byte_length: 1, unsigned }
//! "float16" -> Float  { byte_length: 2, precision: 1 }
//! "long"    -> Int    { byte_length: 8 }
//! "char"    -> String { byte_length: 1 }
//! ```
//!
//! Lookups are case-insensitive. Tokens missing from the table fall through
//! to [`BaseKind::from_name`], which only knows the bare kind names.

/// The kinds a declaration can name directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    /// Fixed-width integer.
    Int,
    /// Precision-scaled number.
    Float,
    /// Bit-packed boolean.
    Boolean,
    /// Text.
    String,
    /// Homogeneous list.
    Array,
    /// Nested schema.
    Object,
    /// One-byte index into a value list.
    Enum,
    /// Millisecond timestamp.
    Date,
}

impl BaseKind {
    /// Resolves a bare kind name as used in the object form `{ type: ... }`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "float" => Self::Float,
            "boolean" | "bit" => Self::Boolean,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            "enum" => Self::Enum,
            "date" => Self::Date,
            _ => return None,
        };
        Some(kind)
    }
}

/// Canonical shape a shorthand token expands to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shorthand {
    /// Kind of the property.
    pub kind: BaseKind,
    /// Fixed width, if the token implies one.
    pub byte_length: Option<usize>,
    /// Unsigned numeric encoding.
    pub unsigned: bool,
    /// Decimal scale for floats.
    pub precision: Option<u32>,
}

impl Shorthand {
    const fn int(byte_length: usize, unsigned: bool) -> Self {
        Self {
            kind: BaseKind::Int,
            byte_length: Some(byte_length),
            unsigned,
            precision: None,
        }
    }

    const fn float(byte_length: usize, unsigned: bool, precision: Option<u32>) -> Self {
        Self {
            kind: BaseKind::Float,
            byte_length: Some(byte_length),
            unsigned,
            precision,
        }
    }

    /// A kind with no implied width or sign.
    #[must_use]
    pub const fn bare(kind: BaseKind) -> Self {
        Self {
            kind,
            byte_length: None,
            unsigned: false,
            precision: None,
        }
    }
}

/// Every shorthand token, in lowercase.
static TYPE_TABLE: &[(&str, Shorthand)] = &[
    ("int8", Shorthand::int(1, false)),
    ("byte", Shorthand::int(1, false)),
    ("uint8", Shorthand::int(1, true)),
    ("ubyte", Shorthand::int(1, true)),
    ("int16", Shorthand::int(2, false)),
    ("short", Shorthand::int(2, false)),
    ("uint16", Shorthand::int(2, true)),
    ("ushort", Shorthand::int(2, true)),
    ("int32", Shorthand::int(4, false)),
    ("int", Shorthand::int(4, false)),
    ("uint32", Shorthand::int(4, true)),
    ("uint", Shorthand::int(4, true)),
    ("int64", Shorthand::int(8, false)),
    ("long", Shorthand::int(8, false)),
    ("uint64", Shorthand::int(8, true)),
    ("ulong", Shorthand::int(8, true)),
    ("float8", Shorthand::float(1, false, Some(1))),
    ("ufloat8", Shorthand::float(1, true, Some(1))),
    ("float16", Shorthand::float(2, false, Some(1))),
    ("ufloat16", Shorthand::float(2, true, Some(1))),
    ("float32", Shorthand::float(4, false, Some(2))),
    ("float", Shorthand::float(4, false, Some(2))),
    ("ufloat32", Shorthand::float(4, true, Some(2))),
    ("ufloat", Shorthand::float(4, true, Some(2))),
    ("float64", Shorthand::float(8, false, None)),
    ("double", Shorthand::float(8, false, None)),
    (
        "char",
        Shorthand {
            kind: BaseKind::String,
            byte_length: Some(1),
            unsigned: false,
            precision: None,
        },
    ),
    ("boolean", Shorthand::bare(BaseKind::Boolean)),
    ("bit", Shorthand::bare(BaseKind::Boolean)),
    ("string", Shorthand::bare(BaseKind::String)),
    ("date", Shorthand::bare(BaseKind::Date)),
];

/// Looks up a shorthand token.
#[must_use]
pub fn lookup(token: &str) -> Option<Shorthand> {
    TYPE_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, shorthand)| *shorthand)
}

/// Expands a string-form declaration.
///
/// Known tokens use the table; anything else is passed through as a bare
/// kind name, and `None` means the token names nothing at all.
#[must_use]
pub fn resolve_token(token: &str) -> Option<Shorthand> {
    lookup(token).or_else(|| BaseKind::from_name(token).map(Shorthand::bare))
}

/// Iterates over every known shorthand token.
pub fn tokens() -> impl Iterator<Item = &'static str> {
    TYPE_TABLE.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_tokens() {
        assert_eq!(lookup("uint8"), Some(Shorthand::int(1, true)));
        assert_eq!(lookup("short"), Some(Shorthand::int(2, false)));
        assert_eq!(lookup("long"), Some(Shorthand::int(8, false)));
        assert_eq!(lookup("UINT"), Some(Shorthand::int(4, true)));
    }

    #[test]
    fn test_float_tokens_carry_precision() {
        let f16 = lookup("float16").unwrap();
        assert_eq!(f16.kind, BaseKind::Float);
        assert_eq!(f16.byte_length, Some(2));
        assert_eq!(f16.precision, Some(1));

        let double = lookup("double").unwrap();
        assert_eq!(double.byte_length, Some(8));
        assert_eq!(double.precision, None);

        assert!(lookup("ufloat").unwrap().unsigned);
    }

    #[test]
    fn test_char_is_one_byte_string() {
        let char_token = lookup("char").unwrap();
        assert_eq!(char_token.kind, BaseKind::String);
        assert_eq!(char_token.byte_length, Some(1));
    }

    #[test]
    fn test_pass_through_and_unknown() {
        assert_eq!(resolve_token("array").map(|s| s.kind), Some(BaseKind::Array));
        assert_eq!(resolve_token("Object").map(|s| s.kind), Some(BaseKind::Object));
        assert_eq!(resolve_token("quaternion"), None);
    }

    #[test]
    fn test_table_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for token in tokens() {
            assert!(seen.insert(token), "duplicate token {token}");
        }
    }
}
