//! Value system
//!
//! A [`Value`] pairs a [`TypeFacade`] with one category payload. The set of
//! categories is closed: nil, builtin, array, record, pointer, reference and
//! offset. Arithmetic lives in [`arith`], envelopes in the private `wire`
//! module.

pub mod arith;
pub mod array;
pub mod offset;
pub mod primitive;
pub mod record;
mod wire;

pub use arith::ArithOp;
pub use array::ArrayValue;
pub use offset::{OffsetValue, ValueHandle};
pub use primitive::{BuiltinCast, Primitive, PrimitiveKind};
pub use record::{RecordEntry, RecordValue};
pub use wire::MAX_VALUE_DEPTH;

use crate::typesys::{Type, TypeFacade, TypeKind};
use cir_common::{IrError, IrResult};
use log::trace;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Category identifiers, also the envelope category byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Nil = 0,
    Builtin = 1,
    Array = 2,
    Record = 3,
    Pointer = 4,
    Reference = 5,
    Offset = 6,
}

/// Whether a category holds one datum or many
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Singular,
    Plural,
}

impl ValueCategory {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => ValueCategory::Nil,
            1 => ValueCategory::Builtin,
            2 => ValueCategory::Array,
            3 => ValueCategory::Record,
            4 => ValueCategory::Pointer,
            5 => ValueCategory::Reference,
            6 => ValueCategory::Offset,
            _ => return None,
        })
    }

    pub fn arity(self) -> Arity {
        match self {
            ValueCategory::Array | ValueCategory::Record => Arity::Plural,
            _ => Arity::Singular,
        }
    }
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueCategory::Nil => "nil",
            ValueCategory::Builtin => "builtin",
            ValueCategory::Array => "array",
            ValueCategory::Record => "record",
            ValueCategory::Pointer => "pointer",
            ValueCategory::Reference => "reference",
            ValueCategory::Offset => "offset",
        };
        write!(f, "{name}")
    }
}

/// Category payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    Nil,
    Builtin(Primitive),
    Array(ArrayValue),
    Record(RecordValue),
    /// Opaque; pointers carry no data in the IR
    Pointer,
    Reference(Box<Value>),
    Offset(OffsetValue),
}

/// A typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    facade: TypeFacade,
    data: ValueData,
}

fn primitive_kind(ty: &Type) -> Option<PrimitiveKind> {
    ty.resolved()
        .as_builtin()
        .and_then(|builtin| PrimitiveKind::from_specifier(builtin.effective_specifier()))
}

impl Value {
    pub fn new(facade: TypeFacade, data: ValueData) -> Self {
        Self { facade, data }
    }

    /// Builtin value typed by the primitive's canonical specifier
    pub fn from_primitive(primitive: Primitive) -> Self {
        Self::new(
            TypeFacade::builtin(primitive.kind().specifier()),
            ValueData::Builtin(primitive),
        )
    }

    /// Zero value of a facade. Records start with no materialized fields.
    pub fn default_for(facade: &TypeFacade) -> Value {
        let ty = facade.ty().resolved();
        let data = if facade.is_pointer() {
            ValueData::Pointer
        } else if facade.is_array() {
            match primitive_kind(ty) {
                Some(kind) => ValueData::Array(ArrayValue::zeroed(kind, facade.array_count() as usize)),
                None => ValueData::Nil,
            }
        } else {
            match ty.kind() {
                TypeKind::Builtin(_) => primitive_kind(ty)
                    .map_or(ValueData::Nil, |kind| ValueData::Builtin(kind.zero())),
                TypeKind::Record(_) => ValueData::Record(RecordValue::new()),
                TypeKind::Pointer(_) => ValueData::Pointer,
                TypeKind::Array { count, element } => match primitive_kind(element) {
                    Some(kind) => ValueData::Array(ArrayValue::zeroed(kind, *count as usize)),
                    None => ValueData::Nil,
                },
                TypeKind::Typedef { .. } | TypeKind::Variadic | TypeKind::Variant(_) | TypeKind::Nil => {
                    ValueData::Nil
                }
            }
        };
        Value::new(facade.clone(), data)
    }

    pub fn facade(&self) -> &TypeFacade {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut TypeFacade {
        &mut self.facade
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ValueData {
        &mut self.data
    }

    pub fn category(&self) -> ValueCategory {
        match self.data {
            ValueData::Nil => ValueCategory::Nil,
            ValueData::Builtin(_) => ValueCategory::Builtin,
            ValueData::Array(_) => ValueCategory::Array,
            ValueData::Record(_) => ValueCategory::Record,
            ValueData::Pointer => ValueCategory::Pointer,
            ValueData::Reference(_) => ValueCategory::Reference,
            ValueData::Offset(_) => ValueCategory::Offset,
        }
    }

    pub fn arity(&self) -> Arity {
        self.category().arity()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.data, ValueData::Nil)
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match &self.data {
            ValueData::Builtin(primitive) => Some(*primitive),
            ValueData::Reference(inner) => inner.as_primitive(),
            _ => None,
        }
    }

    /// Extract a builtin as a Rust type. Fails unless the value is a builtin
    /// (or a reference to one) that converts to `T` without loss.
    pub fn cast<T: BuiltinCast>(&self) -> IrResult<T> {
        match self.as_primitive() {
            Some(primitive) => T::from_primitive(primitive)
                .ok_or_else(|| IrError::invalid_cast(primitive.kind(), T::KIND)),
            None => Err(IrError::invalid_cast(self.category(), T::KIND)),
        }
    }

    /// Record field by name, materialized from the record type with the
    /// field's default value on first access
    pub fn record_field(&mut self, name: &str) -> IrResult<&mut Value> {
        let category = self.category();
        let Some(record_type) = self.facade.ty().as_record() else {
            return Err(IrError::invalid_cast(&self.facade, "record"));
        };
        let offset = record_type
            .field_offset(name)
            .ok_or_else(|| IrError::FieldNotFound { name: name.to_string() })?;
        let field_facade = record_type.field(offset)?.facade.clone();

        match &mut self.data {
            ValueData::Record(record) => Ok(record.materialize(offset, name, || {
                trace!("materializing field '{name}' at offset {offset}");
                Value::default_for(&field_facade)
            })),
            _ => Err(IrError::invalid_cast(category, "record")),
        }
    }

    /// Element count of an array or record, looking through offsets
    pub fn multi_element_size(&self) -> IrResult<usize> {
        match &self.data {
            ValueData::Array(array) => Ok(array.len()),
            ValueData::Record(record) => Ok(record.len()),
            ValueData::Offset(offset) => offset.len(),
            _ => Err(IrError::invalid_cast(self.category(), "multi-element value")),
        }
    }

    pub fn multi_element_empty(&self) -> IrResult<bool> {
        self.multi_element_size().map(|size| size == 0)
    }

    /// Move into a shared handle an offset can point into
    pub fn into_handle(self) -> ValueHandle {
        Rc::new(RefCell::new(self))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Nil => write!(f, "nil"),
            ValueData::Builtin(primitive) => write!(f, "{primitive}"),
            ValueData::Array(array) => write!(f, "{array}"),
            ValueData::Record(record) => write!(f, "{record}"),
            ValueData::Pointer => write!(f, "<pointer>"),
            ValueData::Reference(inner) => write!(f, "&{inner}"),
            ValueData::Offset(offset) => write!(f, "@{}", offset.position()),
        }
    }
}

// Factories

pub fn make_nil() -> Value {
    Value::new(TypeFacade::nil(), ValueData::Nil)
}

pub fn make_builtin<T: BuiltinCast>(value: T) -> Value {
    Value::from_primitive(value.into_primitive())
}

pub fn make_bool(value: bool) -> Value {
    make_builtin(value)
}

pub fn make_char(value: i8) -> Value {
    make_builtin(value)
}

pub fn make_short(value: i16) -> Value {
    make_builtin(value)
}

pub fn make_int(value: i32) -> Value {
    make_builtin(value)
}

pub fn make_uint(value: u32) -> Value {
    make_builtin(value)
}

pub fn make_long(value: i64) -> Value {
    make_builtin(value)
}

pub fn make_ulong(value: u64) -> Value {
    make_builtin(value)
}

pub fn make_float(value: f32) -> Value {
    make_builtin(value)
}

pub fn make_double(value: f64) -> Value {
    make_builtin(value)
}

/// Array of `T`, typed as `T[n]`
pub fn make_array<T: BuiltinCast>(items: impl IntoIterator<Item = T>) -> Value {
    let array = ArrayValue::from_elements(T::KIND, items.into_iter().map(BuiltinCast::into_primitive));
    let facade = TypeFacade::builtin(T::KIND.specifier()).with_array(array.len() as u32);
    Value::new(facade, ValueData::Array(array))
}

/// Record value with no fields materialized yet
pub fn make_record(facade: TypeFacade) -> Value {
    Value::new(facade, ValueData::Record(RecordValue::new()))
}

pub fn make_pointer(facade: TypeFacade) -> Value {
    Value::new(facade, ValueData::Pointer)
}

pub fn make_reference(value: Value) -> Value {
    Value::new(value.facade.clone(), ValueData::Reference(Box::new(value)))
}

pub fn make_offset(target: &ValueHandle, position: usize) -> Value {
    let facade = target.borrow().facade.clone();
    Value::new(facade, ValueData::Offset(OffsetValue::new(target, position)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::{RecordSpecifier, RecordType, Specifier};
    use pretty_assertions::assert_eq;

    fn point_facade() -> TypeFacade {
        let record = RecordType::new("point", RecordSpecifier::Struct)
            .with_field("x", TypeFacade::builtin(Specifier::Int))
            .and_then(|r| r.with_field("y", TypeFacade::builtin(Specifier::Double)))
            .unwrap();
        TypeFacade::from_type(Type::record(record))
    }

    #[test]
    fn test_categories() {
        assert_eq!(make_nil().category(), ValueCategory::Nil);
        assert_eq!(make_array([1u8]).arity(), Arity::Plural);
        assert_eq!(make_int(1).arity(), Arity::Singular);
        for id in 0..7 {
            assert_eq!(ValueCategory::from_id(id).map(ValueCategory::id), Some(id));
        }
        assert_eq!(ValueCategory::from_id(7), None);
    }

    #[test]
    fn test_cast() {
        assert_eq!(make_int(200).cast::<u8>(), Ok(200));
        assert_eq!(
            make_int(-1).cast::<u8>(),
            Err(IrError::invalid_cast("i32", "u8"))
        );
        assert_eq!(make_double(1.5).cast::<f32>(), Ok(1.5));
        assert!(make_double(1.0).cast::<i64>().is_err());
        assert_eq!(make_reference(make_bool(true)).cast::<bool>(), Ok(true));
        assert_eq!(
            make_nil().cast::<i32>(),
            Err(IrError::invalid_cast("nil", "i32"))
        );
    }

    #[test]
    fn test_record_field_materializes_lazily() {
        let mut point = make_record(point_facade());
        assert_eq!(point.multi_element_size(), Ok(0));
        assert_eq!(point.multi_element_empty(), Ok(true));

        assert_eq!(point.record_field("y").unwrap(), &make_double(0.0));
        assert_eq!(point.multi_element_size(), Ok(1));

        *point.record_field("x").unwrap() = make_int(4);
        assert_eq!(point.to_string(), "{x: 4, y: 0}");
        assert_eq!(point.record_field("x").unwrap(), &make_int(4));

        assert_eq!(
            point.record_field("z"),
            Err(IrError::FieldNotFound { name: "z".to_string() })
        );
        assert!(matches!(
            make_int(1).record_field("x"),
            Err(IrError::InvalidTypeCast { .. })
        ));
    }

    #[test]
    fn test_default_for() {
        assert_eq!(
            Value::default_for(&TypeFacade::builtin(Specifier::UnsignedShort)),
            make_builtin(0u16)
        );
        assert!(Value::default_for(&TypeFacade::builtin(Specifier::Void)).is_nil());
        assert_eq!(
            Value::default_for(&TypeFacade::builtin(Specifier::Char).with_pointer(1)).category(),
            ValueCategory::Pointer
        );
        let zeros = Value::default_for(&TypeFacade::builtin(Specifier::Int).with_array(3));
        assert_eq!(zeros.to_string(), "[0, 0, 0]");

        let sized = TypeFacade::from_type(Type::array(2, Rc::new(Type::builtin(Specifier::Float))));
        assert_eq!(Value::default_for(&sized).multi_element_size(), Ok(2));
    }

    #[test]
    fn test_multi_element_through_offset() {
        let target = make_array([1i64, 2, 3, 4]).into_handle();
        let cursor = make_offset(&target, 1);
        assert_eq!(cursor.multi_element_size(), Ok(4));
        assert_eq!(cursor.multi_element_empty(), Ok(false));
        assert_eq!(
            make_int(3).multi_element_size(),
            Err(IrError::invalid_cast("builtin", "multi-element value"))
        );
        assert_eq!(cursor.to_string(), "@1");
    }

    #[test]
    fn test_display() {
        assert_eq!(make_nil().to_string(), "nil");
        assert_eq!(make_array([1i32, 2]).to_string(), "[1, 2]");
        assert_eq!(make_reference(make_int(5)).to_string(), "&5");
        assert_eq!(make_pointer(TypeFacade::nil().with_pointer(1)).to_string(), "<pointer>");
        assert_eq!(make_double(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_equality_ignores_facade_modifiers() {
        let plain = make_int(1);
        let mut tagged = make_int(1);
        tagged.facade_mut().set_pointer_count(1);
        assert_eq!(plain, tagged);
        assert_ne!(make_int(1), make_uint(1));
    }
}
