//! Type envelopes
//!
//! `[variation tag][payload][inline][sensitive][storage][qualifier0][qualifier1]`

use super::{
    BuiltinOptions, BuiltinType, RecordField, RecordSpecifier, RecordType, Specifier,
    StorageClass, Type, TypeFacade, TypeKind, TypeQualifier, TypeTraits, TypeVariation,
};
use cir_common::fatal;
use cir_wire::{ByteStream, WireDecode, WireEncode, WireError, WireResult};
use std::rc::Rc;

/// Smallest possible type envelope: tag plus trailer
const MIN_TYPE_ENVELOPE: usize = 6;

impl WireEncode for TypeTraits {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_bool(self.inline);
        stream.put_bool(self.sensitive);
        stream.put_byte(self.storage.tag());
        for qualifier in self.qualifiers {
            stream.put_byte(qualifier.tag());
        }
    }
}

impl WireDecode for TypeTraits {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        let inline = stream.get_bool()?;
        let sensitive = stream.get_bool()?;
        let storage = stream.get_byte()?;
        let storage =
            StorageClass::from_tag(storage).ok_or(WireError::unknown_tag("storage class", storage))?;
        let mut qualifiers = [TypeQualifier::None; 2];
        for slot in &mut qualifiers {
            let tag = stream.get_byte()?;
            *slot = TypeQualifier::from_tag(tag).ok_or(WireError::unknown_tag("qualifier", tag))?;
        }
        Ok(Self {
            inline,
            sensitive,
            storage,
            qualifiers,
        })
    }
}

impl WireEncode for Type {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_byte(self.variation().tag());
        match self.kind() {
            TypeKind::Builtin(builtin) => {
                stream.put_byte(builtin.specifier().tag());
                stream.put_byte(builtin.options().to_bits());
            }
            TypeKind::Record(record) => {
                stream.put_string(record.name());
                stream.put_byte(record.specifier().tag());
                stream.write_iter(record.fields(), |s, field| {
                    s.put_string(&field.name);
                    field.facade.encode(s);
                });
            }
            TypeKind::Pointer(pointee) => pointee.encode(stream),
            TypeKind::Array { count, element } => {
                stream.put_dword(*count);
                element.encode(stream);
            }
            TypeKind::Typedef { name, resolved } => {
                stream.put_string(name);
                resolved.encode(stream);
            }
            TypeKind::Variant(members) => {
                stream.write_iter(members, |s, member| member.encode(s));
            }
            TypeKind::Variadic | TypeKind::Nil => {}
        }
        self.traits().encode(stream);
    }
}

/// Deepest nesting of pointer, array, typedef, variant and record envelopes
/// a decoder follows
pub const MAX_TYPE_DEPTH: usize = 256;

fn decode_shared(stream: &mut ByteStream, depth: usize) -> WireResult<Rc<Type>> {
    decode_type(stream, depth).map(Rc::new)
}

fn decode_type(stream: &mut ByteStream, depth: usize) -> WireResult<Type> {
    if depth > MAX_TYPE_DEPTH {
        return Err(WireError::malformed(format!(
            "type nested deeper than {MAX_TYPE_DEPTH} levels"
        )));
    }
    let nested = depth + 1;
    let tag = stream.get_byte()?;
    let variation = TypeVariation::from_tag(tag).ok_or(WireError::unknown_tag("type", tag))?;
    let kind = match variation {
        TypeVariation::Builtin => {
            let spec = stream.get_byte()?;
            let specifier =
                Specifier::from_tag(spec).ok_or(WireError::unknown_tag("builtin specifier", spec))?;
            let options = BuiltinOptions::from_bits(stream.get_byte()?);
            TypeKind::Builtin(BuiltinType::with_options(specifier, options))
        }
        TypeVariation::Record => {
            let name = stream.get_string()?;
            let spec = stream.get_byte()?;
            let specifier =
                RecordSpecifier::from_tag(spec).ok_or(WireError::unknown_tag("record specifier", spec))?;
            let mut record = RecordType::new(name, specifier);
            let count = stream.get_len("record fields", MIN_TYPE_ENVELOPE)?;
            for _ in 0..count {
                let name = stream.get_string()?;
                if record.field_offset(&name).is_some() {
                    return Err(WireError::malformed(format!(
                        "duplicate field '{name}' in record '{}'",
                        record.name()
                    )));
                }
                let facade = TypeFacade::new(decode_shared(stream, nested)?);
                record.push_decoded(RecordField { name, facade });
            }
            TypeKind::Record(record)
        }
        TypeVariation::Pointer => TypeKind::Pointer(decode_shared(stream, nested)?),
        TypeVariation::Array => {
            let count = stream.get_dword()?;
            TypeKind::Array {
                count,
                element: decode_shared(stream, nested)?,
            }
        }
        TypeVariation::Typedef => {
            let name = stream.get_string()?;
            TypeKind::Typedef {
                name,
                resolved: decode_shared(stream, nested)?,
            }
        }
        TypeVariation::Variant => {
            let count = stream.get_len("variant members", MIN_TYPE_ENVELOPE)?;
            let mut members = Vec::with_capacity(count);
            for _ in 0..count {
                members.push(decode_shared(stream, nested)?);
            }
            TypeKind::Variant(members)
        }
        TypeVariation::Variadic => TypeKind::Variadic,
        TypeVariation::Nil => TypeKind::Nil,
    };
    let traits = TypeTraits::decode(stream)?;
    Ok(Type::from_parts(kind, traits))
}

impl WireDecode for Type {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        decode_type(stream, 0)
    }
}

/// A facade on the wire is its type envelope only; pointer and array
/// modifiers belong to the use site that owns the facade.
impl WireEncode for TypeFacade {
    fn encode(&self, stream: &mut ByteStream) {
        self.ty().encode(stream);
    }
}

impl WireDecode for TypeFacade {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        decode_shared(stream, 0).map(TypeFacade::new)
    }
}

impl Type {
    /// Encode into a fresh buffer
    pub fn serialize(&self) -> Vec<u8> {
        self.to_wire()
    }

    /// Decode a buffer produced by [`Type::serialize`]. Corrupt input is an
    /// internal invariant violation.
    pub fn deserialize(bytes: &[u8]) -> Type {
        match Type::from_wire(bytes) {
            Ok(ty) => ty,
            Err(err) => fatal!("corrupt type envelope: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(ty: &Type) -> Type {
        let decoded = Type::deserialize(&ty.serialize());
        assert!(decoded.identical(ty), "{decoded} is not identical to {ty}");
        decoded
    }

    #[test]
    fn test_builtin_layout() {
        let ty = Type::builtin(Specifier::Int);
        assert_eq!(ty.serialize(), vec![100, Specifier::Int.tag(), 0, 0, 0, 0, 0, 0]);

        let mut options = BuiltinOptions::default();
        options.unsigned = true;
        options.long = true;
        let ty = Type::from_builtin(BuiltinType::with_options(Specifier::Int, options))
            .with_storage(StorageClass::Extern)
            .with_qualifier(TypeQualifier::Volatile);
        assert_eq!(ty.serialize(), vec![100, 7, 0x05, 0, 0, 3, 2, 0]);
        assert_eq!(roundtrip(&ty), ty);
    }

    #[test]
    fn test_every_variation_roundtrips() {
        let int = Rc::new(Type::builtin(Specifier::Int));
        let mut record = RecordType::new("pair", RecordSpecifier::Struct);
        record.add_field("a", TypeFacade::new(Rc::clone(&int))).unwrap();
        record
            .add_field("b", TypeFacade::builtin(Specifier::Double))
            .unwrap();

        let mut inline = Type::builtin(Specifier::Void);
        inline.set_inline(true);
        inline.set_sensitive(true);

        let types = vec![
            inline,
            Type::record(record),
            Type::record(RecordType::anonymous(RecordSpecifier::Union)),
            Type::pointer(Rc::clone(&int)),
            Type::array(16, Rc::new(Type::builtin(Specifier::Char))),
            Type::typedef("word", Rc::clone(&int)).with_qualifier(TypeQualifier::Const),
            Type::variadic(),
            Type::variant(vec![Rc::clone(&int), Rc::new(Type::nil())]),
            Type::nil().with_storage(StorageClass::Register),
        ];
        for ty in &types {
            assert_eq!(&roundtrip(ty), ty);
        }
    }

    #[test]
    fn test_facade_envelope_is_type_envelope() {
        let facade = TypeFacade::builtin(Specifier::Char).with_pointer(2);
        assert_eq!(facade.to_wire(), Type::builtin(Specifier::Char).serialize());
        let decoded = TypeFacade::from_wire(&facade.to_wire()).unwrap();
        assert_eq!(decoded.pointer_count(), 0);
        assert_eq!(decoded, facade);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Type::from_wire(&[99]),
            Err(WireError::unknown_tag("type", 99))
        );
        assert_eq!(
            Type::from_wire(&[100, 42, 0, 0, 0, 0, 0, 0]),
            Err(WireError::unknown_tag("builtin specifier", 42))
        );
        assert_eq!(
            Type::from_wire(&[107, 0, 0, 9, 0, 0]),
            Err(WireError::unknown_tag("storage class", 9))
        );
        assert!(matches!(
            Type::from_wire(&[104]),
            Err(WireError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let mut ty = Type::builtin(Specifier::Char);
        for _ in 0..MAX_TYPE_DEPTH {
            ty = Type::pointer(Rc::new(ty));
        }
        roundtrip(&ty);

        let too_deep = Type::pointer(Rc::new(ty)).serialize();
        let expected = Err(WireError::malformed(format!(
            "type nested deeper than {MAX_TYPE_DEPTH} levels"
        )));
        assert_eq!(Type::from_wire(&too_deep), expected);
        assert_eq!(
            Type::from_wire(&vec![TypeVariation::Pointer.tag(); 2_000_000]),
            expected
        );

        let mut stream = ByteStream::new();
        stream.put_byte(TypeVariation::Variant.tag());
        stream.put_word(1);
        stream.put_bytes(&too_deep);
        assert_eq!(Type::from_wire(stream.as_bytes()), expected);
    }

    #[test]
    fn test_duplicate_record_field_is_malformed() {
        let mut stream = ByteStream::new();
        stream.put_byte(TypeVariation::Record.tag());
        stream.put_string("dup");
        stream.put_byte(RecordSpecifier::Struct.tag());
        stream.put_word(2);
        for _ in 0..2 {
            stream.put_string("x");
            Type::builtin(Specifier::Int).encode(&mut stream);
        }
        TypeTraits::default().encode(&mut stream);
        assert!(matches!(
            Type::from_wire(stream.as_bytes()),
            Err(WireError::Malformed { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "corrupt type envelope")]
    fn test_deserialize_unknown_tag_is_fatal() {
        Type::deserialize(&[0xFF]);
    }
}
