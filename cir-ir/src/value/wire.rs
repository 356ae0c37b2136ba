//! Value envelopes: `[type envelope][category id][payload]`

use super::primitive::decode_kind;
use super::{make_nil, ArrayValue, OffsetValue, Primitive, RecordValue, Value, ValueCategory, ValueData};
use crate::typesys::TypeFacade;
use cir_common::fatal;
use cir_wire::{ByteStream, WireDecode, WireEncode, WireError, WireResult};

impl WireEncode for Value {
    fn encode(&self, stream: &mut ByteStream) {
        self.facade.encode(stream);
        stream.put_byte(self.category().id());
        match &self.data {
            ValueData::Nil | ValueData::Pointer => {}
            ValueData::Builtin(primitive) => primitive.encode(stream),
            ValueData::Array(array) => {
                stream.put_byte(array.element_kind().tag());
                stream.write_iter(array.elements(), |s, element| element.encode_raw(s));
            }
            ValueData::Record(record) => {
                stream.write_iter(record.iter().collect::<Vec<_>>(), |s, (_, entry)| {
                    s.put_string(&entry.name);
                    entry.value.encode(s);
                });
            }
            ValueData::Reference(inner) => inner.encode(stream),
            ValueData::Offset(offset) => {
                stream.put_dword(offset.position() as u64);
                // A dead target, or one already being written further up,
                // goes out as nil
                if offset.visit_target(|target| target.encode(stream)).is_none() {
                    make_nil().encode(stream);
                }
            }
        }
    }
}

/// Deepest nesting of reference, offset and record value envelopes a decoder
/// follows
pub const MAX_VALUE_DEPTH: usize = 256;

impl WireDecode for Value {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        decode_value(stream, 0)
    }
}

fn decode_value(stream: &mut ByteStream, depth: usize) -> WireResult<Value> {
    if depth > MAX_VALUE_DEPTH {
        return Err(WireError::malformed(format!(
            "value nested deeper than {MAX_VALUE_DEPTH} levels"
        )));
    }
    let facade = TypeFacade::decode(stream)?;
    let id = stream.get_byte()?;
    let category = ValueCategory::from_id(id).ok_or(WireError::unknown_tag("value category", id))?;
    let data = match category {
        ValueCategory::Nil => ValueData::Nil,
        ValueCategory::Pointer => ValueData::Pointer,
        ValueCategory::Builtin => ValueData::Builtin(Primitive::decode(stream)?),
        ValueCategory::Array => {
            let kind = decode_kind(stream)?;
            let count = stream.get_len("array elements", kind.size())?;
            let mut array = ArrayValue::new(kind);
            for _ in 0..count {
                array.push(Primitive::decode_raw(kind, stream)?);
            }
            ValueData::Array(array)
        }
        ValueCategory::Record => ValueData::Record(decode_record(&facade, stream, depth + 1)?),
        ValueCategory::Reference => ValueData::Reference(Box::new(decode_value(stream, depth + 1)?)),
        ValueCategory::Offset => {
            let position = stream.get_dword()?;
            let position = usize::try_from(position)
                .map_err(|_| WireError::malformed(format!("offset position {position} overflows")))?;
            let target = decode_value(stream, depth + 1)?;
            ValueData::Offset(OffsetValue::anchored(target.into_handle(), position))
        }
    };
    Ok(Value::new(facade, data))
}

/// Field names resolve to offsets through the record type; names the type
/// does not know take the next free offset.
fn decode_record(facade: &TypeFacade, stream: &mut ByteStream, depth: usize) -> WireResult<RecordValue> {
    let record_type = facade.ty().as_record();
    let count = stream.get_len("record value fields", 4)?;
    let mut record = RecordValue::new();
    for _ in 0..count {
        let name = stream.get_string()?;
        let value = decode_value(stream, depth)?;
        let offset = record_type
            .and_then(|ty| ty.field_offset(&name))
            .unwrap_or_else(|| record.next_offset());
        record
            .insert(offset, name, value)
            .map_err(|err| WireError::malformed(err.to_string()))?;
    }
    Ok(record)
}

impl Value {
    /// Encode into a fresh buffer
    pub fn serialize(&self) -> Vec<u8> {
        self.to_wire()
    }

    /// Decode a buffer produced by [`Value::serialize`]. Corrupt input is an
    /// internal invariant violation.
    pub fn deserialize(bytes: &[u8]) -> Value {
        match Value::from_wire(bytes) {
            Ok(value) => value,
            Err(err) => fatal!("corrupt value envelope: {err}"),
        }
    }
}
