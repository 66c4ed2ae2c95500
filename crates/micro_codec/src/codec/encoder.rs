//! # Encoder
//!
//! Writes a JSON value through a compiled schema.
//!
//! Fields are written in schema order and each one is atomic: a field that
//! does not fit in what is left of the budget is dropped together with every
//! field after it. Fixed-width slots are the exception inside themselves,
//! their content is cut to the slot and zero-padded.

use serde_json::Value;
use tracing::warn;

use super::buffer::ByteWriter;
use super::date_millis;
use crate::schema::decl::truthy;
use crate::schema::{ArraySpec, BitGroupSpec, CompiledSchema, Kind, ObjectSpec, PropertyDescriptor};

/// Encodes `data` with at most `max_bytes` bytes of output.
///
/// Missing and null fields take their defaults. Values of the wrong type
/// are treated as missing. Never fails; a small budget only shortens the
/// output.
#[must_use]
pub fn encode(schema: &CompiledSchema, data: &Value, max_bytes: usize) -> Vec<u8> {
    let mut writer = ByteWriter::new(max_bytes);
    write_fields(schema, data, &mut writer);
    writer.into_bytes()
}

/// Writes fields until one does not fit. Returns true if all were written.
fn write_fields(schema: &CompiledSchema, data: &Value, writer: &mut ByteWriter) -> bool {
    for descriptor in schema {
        let complete = match &descriptor.kind {
            Kind::BitGroup(group) => writer.write_u8(pack_bits(group, data)),
            _ => write_atomic(descriptor, field_value(descriptor, data), writer),
        };
        if !complete {
            return false;
        }
    }
    true
}

/// The field's value, or its default when absent or null.
fn field_value<'v>(descriptor: &'v PropertyDescriptor, data: &'v Value) -> &'v Value {
    match data.get(descriptor.key()) {
        Some(value) if !value.is_null() => value,
        _ => &descriptor.default_value,
    }
}

/// Writes one value, all or nothing.
fn write_atomic(descriptor: &PropertyDescriptor, value: &Value, writer: &mut ByteWriter) -> bool {
    if let Some(width) = descriptor.byte_length {
        // Fixed slots never write more or less than their width.
        return writer.remaining() >= width && write_value(descriptor, value, writer);
    }

    let mut scratch = ByteWriter::new(writer.remaining());
    write_value(descriptor, value, &mut scratch) && writer.write_bytes(scratch.as_slice())
}

fn write_value(descriptor: &PropertyDescriptor, value: &Value, writer: &mut ByteWriter) -> bool {
    let width = descriptor.byte_length;
    match &descriptor.kind {
        Kind::Int { unsigned } => {
            let width = width.unwrap_or(4);
            let source = if value.is_number() { value } else { &descriptor.default_value };
            writer.write_int(clamp_int(int_value(source), width, *unsigned), width)
        }
        Kind::Float { unsigned, precision } => match width {
            Some(8) | None => writer.write_f64(number_or(value, &descriptor.default_value)),
            Some(width) => {
                let scaled = number_or(value, &descriptor.default_value) * 10f64.powi(*precision as i32);
                writer.write_int(clamp_int(round_to_int(scaled), width, *unsigned), width)
            }
        },
        Kind::Boolean => writer.write_u8(u8::from(truthy(value))),
        Kind::BitGroup(group) => writer.write_u8(pack_bits(group, value)),
        Kind::String { encoding, large } => {
            let text = value
                .as_str()
                .or_else(|| descriptor.default_value.as_str())
                .unwrap_or_default();
            match width {
                Some(width) => {
                    let bytes = encoding.encode(text, width);
                    writer.write_bytes(&bytes) && pad_to(writer, width - bytes.len())
                }
                None => {
                    let limit = if *large { usize::from(u16::MAX) } else { usize::from(u8::MAX) };
                    let bytes = encoding.encode(text, limit);
                    write_prefix(writer, bytes.len(), *large) && writer.write_bytes(&bytes)
                }
            }
        }
        Kind::Array(spec) => {
            let items = value
                .as_array()
                .or_else(|| descriptor.default_value.as_array())
                .map_or(&[][..], Vec::as_slice);
            write_array(spec, items, width, writer)
        }
        Kind::Object(spec) => write_object(spec, value, &descriptor.default_value, width, writer),
        Kind::Enum(spec) => {
            let index = match value {
                Value::String(s) => spec.index_of(Some(s.as_str())),
                Value::Null => spec.index_of(None),
                _ => spec.default_index,
            };
            writer.write_u8(u8::try_from(index).unwrap_or(u8::MAX))
        }
        Kind::Date => {
            let millis = if value.is_null() {
                0.0
            } else {
                date_millis(value).unwrap_or_else(|| {
                    warn!(field = %descriptor.name, value = %value, "Unable to parse date value, writing 0");
                    0.0
                })
            };
            writer.write_f64(millis)
        }
    }
}

fn write_array(spec: &ArraySpec, items: &[Value], width: Option<usize>, writer: &mut ByteWriter) -> bool {
    let count = items.len().min(spec.max_length);
    let element = spec.element.as_ref();

    match width {
        Some(width) => {
            let mut slot = ByteWriter::new(width);
            for item in &items[..count] {
                if !write_element(element, item, &mut slot) {
                    break;
                }
            }
            let used = slot.len();
            writer.write_bytes(slot.as_slice()) && pad_to(writer, width - used)
        }
        None => {
            if !write_prefix(writer, count, spec.large) {
                return false;
            }
            items[..count]
                .iter()
                .all(|item| write_element(element, item, writer))
        }
    }
}

fn write_element(element: &PropertyDescriptor, item: &Value, writer: &mut ByteWriter) -> bool {
    let value = if item.is_null() { &element.default_value } else { item };
    write_atomic(element, value, writer)
}

fn write_object(
    spec: &ObjectSpec,
    value: &Value,
    default_value: &Value,
    width: Option<usize>,
    writer: &mut ByteWriter,
) -> bool {
    if spec.allow_null {
        if value.is_null() {
            return writer.write_u8(1);
        }
        if !writer.write_u8(0) {
            return false;
        }
    }

    let data = if value.is_object() { value } else { default_value };
    match width {
        Some(width) => {
            let mut slot = ByteWriter::new(width);
            write_fields(&spec.schema, data, &mut slot);
            let used = slot.len();
            writer.write_bytes(slot.as_slice()) && pad_to(writer, width - used)
        }
        None => write_fields(&spec.schema, data, writer),
    }
}

fn pack_bits(group: &BitGroupSpec, data: &Value) -> u8 {
    group
        .names
        .iter()
        .zip(&group.defaults)
        .enumerate()
        .fold(0u8, |byte, (index, (name, default))| {
            let set = match data.get(name) {
                Some(value) if !value.is_null() => truthy(value),
                _ => *default,
            };
            if set {
                byte | BitGroupSpec::mask(index)
            } else {
                byte
            }
        })
}

fn write_prefix(writer: &mut ByteWriter, len: usize, large: bool) -> bool {
    if large {
        u16::try_from(len).is_ok_and(|len| writer.write_u16(len))
    } else {
        u8::try_from(len).is_ok_and(|len| writer.write_u8(len))
    }
}

fn pad_to(writer: &mut ByteWriter, count: usize) -> bool {
    if writer.remaining() < count {
        return false;
    }
    writer.pad(count);
    true
}

/// Integer value of a JSON number; anything else is 0.
fn int_value(value: &Value) -> i128 {
    let Value::Number(n) = value else {
        return 0;
    };
    if let Some(i) = n.as_i64() {
        i128::from(i)
    } else if let Some(u) = n.as_u64() {
        i128::from(u)
    } else {
        n.as_f64().map_or(0, round_to_int)
    }
}

fn number_or(value: &Value, default_value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| default_value.as_f64())
        .unwrap_or(0.0)
}

/// Rounds half away from zero. NaN becomes 0, infinities saturate.
fn round_to_int(value: f64) -> i128 {
    value.round() as i128
}

/// Saturates `value` to the range of a `width`-byte integer.
fn clamp_int(value: i128, width: usize, unsigned: bool) -> i128 {
    let bits = (width * 8) as u32;
    let (min, max) = if unsigned {
        (0, (1i128 << bits) - 1)
    } else {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    };
    value.clamp(min, max)
}
