//! Envelope round trips through the public API

use cir_ir::typesys::{RecordSpecifier, RecordType, StorageClass, TypeQualifier};
use cir_ir::{
    make_array, make_char, make_int, make_record, make_ulong, Specifier, Type, TypeFacade, Value,
};
use cir_wire::{WireDecode, WireEncode};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn every_type() -> Vec<Type> {
    let int = Rc::new(Type::builtin(Specifier::Int));
    let record = RecordType::new("node", RecordSpecifier::Struct)
        .with_field("value", TypeFacade::builtin(Specifier::Long))
        .and_then(|r| r.with_field("next", TypeFacade::builtin(Specifier::Void).with_pointer(1)))
        .expect("distinct field names");
    vec![
        Type::builtin(Specifier::Double)
            .with_storage(StorageClass::Static)
            .with_qualifier(TypeQualifier::Const),
        Type::record(record),
        Type::pointer(Rc::clone(&int)),
        Type::array(16, Rc::clone(&int)),
        Type::typedef("size_t", Rc::new(Type::builtin(Specifier::Long))),
        Type::variadic(),
        Type::variant(vec![Rc::clone(&int), Rc::new(Type::builtin(Specifier::Char))]),
        Type::nil(),
    ]
}

#[test]
fn test_every_type_variant_roundtrips() {
    for ty in every_type() {
        let decoded = Type::deserialize(&ty.serialize());
        assert_eq!(decoded, ty);
        assert!(decoded.identical(&ty), "trailer lost for {ty}");
    }
}

#[test]
fn test_type_envelope_equals_stream_encoding() {
    for ty in every_type() {
        assert_eq!(ty.serialize(), ty.to_wire());
        assert_eq!(Type::from_wire(&ty.to_wire()).as_ref(), Ok(&ty));
    }
}

#[test]
fn test_builtin_int_value_bytes() {
    let bytes = make_int(12).serialize();
    let type_len = Type::builtin(Specifier::Int).serialize().len();
    assert_eq!(&bytes[type_len..], &[1, 6, 0x0C, 0, 0, 0]);
    assert_eq!(Value::deserialize(&bytes), make_int(12));
}

#[test]
fn test_builtin_array_and_record_values_roundtrip() {
    let record_type = RecordType::new("pair", RecordSpecifier::Struct)
        .with_field("a", TypeFacade::builtin(Specifier::Char))
        .and_then(|r| r.with_field("b", TypeFacade::builtin(Specifier::Int)))
        .expect("distinct field names");
    let mut pair = make_record(TypeFacade::from_type(Type::record(record_type)));
    *pair.record_field("b").expect("declared field") = make_int(40);
    *pair.record_field("a").expect("declared field") = make_char(2);

    for value in [make_ulong(7), make_array([1i32, 2, 3]), pair] {
        assert_eq!(Value::deserialize(&value.serialize()), value);
    }
}
