//! # Decoder
//!
//! Reads bytes back into a JSON object through a compiled schema.
//!
//! The decoder never fails. It reads fields until the buffer runs out and
//! returns what it has: a scalar that cannot be read in full is left out, a
//! nested array or object is kept with whatever it managed to read, and
//! decoding stops there.

use serde_json::{Map, Number, Value};
use tracing::debug;

use super::buffer::ByteReader;
use super::millis_to_date;
use crate::schema::{ArraySpec, BitGroupSpec, CompiledSchema, Kind, ObjectSpec, PropertyDescriptor};

/// A decoded value and whether it was read in full.
struct Decoded {
    value: Value,
    complete: bool,
}

impl Decoded {
    const fn full(value: Value) -> Self {
        Self {
            value,
            complete: true,
        }
    }

    const fn partial(value: Value) -> Self {
        Self {
            value,
            complete: false,
        }
    }
}

/// Decodes as many fields as `bytes` holds.
#[must_use]
pub fn decode(schema: &CompiledSchema, bytes: &[u8]) -> Map<String, Value> {
    decode_prefix(schema, bytes).0
}

/// Decodes as many fields as `bytes` holds, also returning the number of
/// bytes consumed.
#[must_use]
pub fn decode_prefix(schema: &CompiledSchema, bytes: &[u8]) -> (Map<String, Value>, usize) {
    let mut reader = ByteReader::new(bytes);
    let mut out = Map::new();
    read_fields(schema, &mut reader, &mut out);
    (out, reader.position())
}

/// Reads fields into `out` until one is short. Returns true if all were read.
fn read_fields(schema: &CompiledSchema, reader: &mut ByteReader<'_>, out: &mut Map<String, Value>) -> bool {
    for descriptor in schema {
        if reader.remaining() == 0 && !descriptor.is_zero_width() {
            return false;
        }

        if let Kind::BitGroup(group) = &descriptor.kind {
            let Some(byte) = reader.read_u8() else {
                return false;
            };
            for (index, name) in group.names.iter().enumerate() {
                out.insert(name.clone(), Value::Bool(byte & BitGroupSpec::mask(index) != 0));
            }
            continue;
        }

        let Some(decoded) = read_value(descriptor, reader) else {
            return false;
        };
        out.insert(descriptor.key().to_string(), decoded.value);
        if !decoded.complete {
            return false;
        }
    }
    true
}

fn read_value(descriptor: &PropertyDescriptor, reader: &mut ByteReader<'_>) -> Option<Decoded> {
    let width = descriptor.byte_length;
    let value = match &descriptor.kind {
        Kind::Int { unsigned } => int_to_value(reader.read_int(width.unwrap_or(4), *unsigned)?),
        Kind::Float { unsigned, precision } => match width {
            Some(8) | None => float_to_value(reader.read_f64()?),
            Some(width) => {
                let raw = reader.read_int(width, *unsigned)?;
                if *precision == 0 {
                    int_to_value(raw)
                } else {
                    float_to_value(raw as f64 / 10f64.powi(*precision as i32))
                }
            }
        },
        Kind::Boolean => Value::Bool(reader.read_u8()? != 0),
        Kind::BitGroup(_) => Value::from(reader.read_u8()?),
        Kind::String { encoding, large } => match width {
            Some(width) => Value::String(encoding.decode_padded(reader.read_bytes(width)?)),
            None => {
                let mut probe = *reader;
                let len = read_prefix(&mut probe, *large)?;
                let text = encoding.decode(probe.read_bytes(len)?);
                *reader = probe;
                Value::String(text)
            }
        },
        Kind::Array(spec) => return read_array(spec, width, reader),
        Kind::Object(spec) => return read_object(spec, width, reader),
        Kind::Enum(spec) => {
            let index = usize::from(reader.read_u8()?);
            if index >= spec.values.len() {
                debug!(field = %descriptor.name, index, "Enum index out of range, using default");
            }
            spec.value_at(index).map_or(Value::Null, |v| Value::String(v.to_string()))
        }
        Kind::Date => millis_to_date(reader.read_f64()?),
    };
    Some(Decoded::full(value))
}

fn read_array(spec: &ArraySpec, width: Option<usize>, reader: &mut ByteReader<'_>) -> Option<Decoded> {
    let element = spec.element.as_ref();

    let Some(width) = width else {
        let count = read_prefix(reader, spec.large)?;
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            match read_value(element, reader) {
                Some(decoded) if decoded.complete => items.push(decoded.value),
                Some(decoded) => {
                    items.push(decoded.value);
                    return Some(Decoded::partial(Value::Array(items)));
                }
                None => return Some(Decoded::partial(Value::Array(items))),
            }
        }
        return Some(Decoded::full(Value::Array(items)));
    };

    let complete = reader.remaining() >= width;
    let slot = reader.rest().get(..width).unwrap_or_else(|| reader.rest());
    reader.skip(width);

    let mut slot_reader = ByteReader::new(slot);
    let mut items: Vec<(Value, usize, usize)> = Vec::new();
    while items.len() < spec.max_length && slot_reader.remaining() > 0 {
        let start = slot_reader.position();
        let Some(decoded) = read_value(element, &mut slot_reader) else {
            break;
        };
        items.push((decoded.value, start, slot_reader.position()));
        if !decoded.complete {
            break;
        }
    }

    // Trailing slots that are all zero are padding.
    while let Some((_, start, end)) = items.last() {
        if slot[*start..*end].iter().all(|b| *b == 0) {
            items.pop();
        } else {
            break;
        }
    }

    let value = Value::Array(items.into_iter().map(|(value, _, _)| value).collect());
    Some(if complete {
        Decoded::full(value)
    } else {
        Decoded::partial(value)
    })
}

fn read_object(spec: &ObjectSpec, width: Option<usize>, reader: &mut ByteReader<'_>) -> Option<Decoded> {
    if spec.allow_null {
        if reader.read_u8()? != 0 {
            return Some(Decoded::full(Value::Null));
        }
        if reader.remaining() == 0 {
            return Some(Decoded::partial(Value::Object(Map::new())));
        }
    }

    let mut fields = Map::new();
    let complete = match width {
        Some(width) => {
            let whole = reader.remaining() >= width;
            let slot = reader.rest().get(..width).unwrap_or_else(|| reader.rest());
            reader.skip(width);
            let mut slot_reader = ByteReader::new(slot);
            // A fixed slot may legitimately hold a truncated object.
            read_fields(&spec.schema, &mut slot_reader, &mut fields);
            whole
        }
        None => {
            let mut nested = ByteReader::new(reader.rest());
            let done = read_fields(&spec.schema, &mut nested, &mut fields);
            reader.skip(nested.position());
            done
        }
    };

    let value = Value::Object(fields);
    Some(if complete {
        Decoded::full(value)
    } else {
        Decoded::partial(value)
    })
}

fn read_prefix(reader: &mut ByteReader<'_>, large: bool) -> Option<usize> {
    if large {
        reader.read_u16().map(usize::from)
    } else {
        reader.read_u8().map(usize::from)
    }
}

fn int_to_value(raw: i128) -> Value {
    if let Ok(i) = i64::try_from(raw) {
        Value::from(i)
    } else if let Ok(u) = u64::try_from(raw) {
        Value::from(u)
    } else {
        Value::Null
    }
}

fn float_to_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::config::SerializerConfig;
    use crate::schema::{Compiler, SchemaDecl};
    use serde_json::json;
    use std::sync::Arc;

    fn schema(value: Value) -> CompiledSchema {
        let config = SerializerConfig::default();
        let lookup = |_: &str| -> Option<Arc<CompiledSchema>> { None };
        Compiler::new(&config, &lookup)
            .compile(&SchemaDecl::from_value(&value).unwrap())
            .unwrap()
    }

    fn round_trip(schema: &CompiledSchema, data: &Value) -> Value {
        Value::Object(decode(schema, &encode(schema, data, 4096)))
    }

    #[test]
    fn test_bits_and_ints() {
        let s = schema(json!({"a": "uint8", "b": "boolean", "c": "boolean"}));
        assert_eq!(decode(&s, &[200, 0x80]), json!({"a": 200, "b": true, "c": false}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_float_scaling() {
        let s = schema(json!({"x": {"type": "float", "byteLength": 2, "precision": 1}}));
        assert_eq!(round_trip(&s, &json!({"x": 3.14159})), json!({"x": 3.1}));
    }

    #[test]
    fn test_signed_and_unsigned_widths() {
        let s = schema(json!({"a": "int16", "b": "uint32", "c": "long", "d": "ulong"}));
        let data = json!({"a": -300, "b": 4_000_000_000_u32, "c": -5, "d": u64::MAX});
        assert_eq!(round_trip(&s, &data), data);
    }

    #[test]
    fn test_short_scalar_stops_decoding() {
        let s = schema(json!({"a": "uint8", "b": "uint32", "c": "uint8"}));
        assert_eq!(Value::Object(decode(&s, &[1, 0, 0])), json!({"a": 1}));
    }

    #[test]
    fn test_short_string_stops_decoding() {
        let s = schema(json!({"a": "string", "b": "uint8"}));
        assert_eq!(Value::Object(decode(&s, &[5, b'a', b'b'])), json!({}));
    }

    #[test]
    fn test_fixed_array_drops_padding() {
        let s = schema(json!({"a": {"type": "array", "element": "uint8", "byteLength": 3}, "z": "uint8"}));
        assert_eq!(Value::Object(decode(&s, &[1, 2, 0, 9])), json!({"a": [1, 2], "z": 9}));
        assert_eq!(Value::Object(decode(&s, &[0, 0, 5, 9])), json!({"a": [0, 0, 5], "z": 9}));
    }

    #[test]
    fn test_partial_array_is_kept() {
        let s = schema(json!({"a": ["short"], "z": "uint8"}));
        assert_eq!(Value::Object(decode(&s, &[3, 0, 1, 0, 2, 0])), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_nullable_object() {
        let s = schema(json!({
            "o": {"type": "object", "allowNull": true, "schema": {"a": "uint8"}},
            "z": "uint8"
        }));
        assert_eq!(Value::Object(decode(&s, &[1, 4])), json!({"o": null, "z": 4}));
        assert_eq!(Value::Object(decode(&s, &[0, 7, 4])), json!({"o": {"a": 7}, "z": 4}));
    }

    #[test]
    fn test_any_nonzero_null_flag_means_null() {
        let s = schema(json!({
            "o": {"type": "object", "allowNull": true, "schema": {"x": "uint8"}},
            "z": "uint8"
        }));
        assert_eq!(Value::Object(decode(&s, &[2, 7, 9])), json!({"o": null, "z": 7}));
        assert_eq!(Value::Object(decode(&s, &[255, 7])), json!({"o": null, "z": 7}));
    }

    #[test]
    fn test_trailing_empty_object_survives() {
        let s = schema(json!({
            "a": "uint8",
            "o": {"type": "object", "schema": {}},
            "n": {"type": "object", "schema": {"inner": {"type": "object", "schema": {}}}}
        }));
        let data = json!({"a": 1, "o": {}, "n": {"inner": {}}});
        assert_eq!(encode(&s, &data, 64), vec![1]);
        assert_eq!(round_trip(&s, &data), data);
        assert_eq!(Value::Object(decode(&s, &[])), json!({}));
    }

    #[test]
    fn test_fixed_object_advances_by_slot() {
        let s = schema(json!({
            "o": {"type": "object", "byteLength": 3, "schema": {"a": "uint8", "b": "uint16", "c": "uint8"}},
            "z": "uint8"
        }));
        assert_eq!(Value::Object(decode(&s, &[1, 0, 2, 4])), json!({"o": {"a": 1, "b": 2}, "z": 4}));
    }

    #[test]
    fn test_enum_out_of_range_uses_default() {
        let s = schema(json!({"e": {"type": "enum", "values": ["a", "b"], "defaultValue": "b"}}));
        assert_eq!(Value::Object(decode(&s, &[0])), json!({"e": "a"}));
        assert_eq!(Value::Object(decode(&s, &[200])), json!({"e": "b"}));
        let s = schema(json!({"e": {"type": "enum", "values": ["a"]}}));
        assert_eq!(Value::Object(decode(&s, &[1])), json!({"e": null}));
    }

    #[test]
    fn test_dates() {
        let s = schema(json!({"d": "date", "e": "date"}));
        let data = json!({"d": "2014-01-01T00:00:00.000Z"});
        assert_eq!(round_trip(&s, &data), json!({"d": "2014-01-01T00:00:00.000Z", "e": null}));
    }

    #[test]
    fn test_fixed_string_trailing_nuls() {
        let s = schema(json!({"s": {"type": "string", "byteLength": 6}}));
        assert_eq!(round_trip(&s, &json!({"s": "fra"})), json!({"s": "fra"}));
    }

    #[test]
    fn test_consumed_bytes_reported() {
        let s = schema(json!({"a": "uint8", "s": "string"}));
        let (_, consumed) = decode_prefix(&s, &[1, 2, b'h', b'i', 99, 98]);
        assert_eq!(consumed, 4);
    }
}
