//! Arithmetic across value categories
//!
//! Builtins combine after the usual arithmetic conversions. Arrays combine
//! element-wise with an equal-length array or broadcast a scalar, keeping
//! their element kind. References forward to the value they own. Every
//! other category rejects arithmetic.

use super::array::ArrayValue;
use super::primitive::{Primitive, PrimitiveKind};
use super::{Value, ValueData};
use cir_common::{IrError, IrResult};
use std::fmt;
use std::ops;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "+"),
            ArithOp::Sub => write!(f, "-"),
            ArithOp::Mul => write!(f, "*"),
            ArithOp::Div => write!(f, "/"),
            ArithOp::Rem => write!(f, "%"),
        }
    }
}

fn elementwise(
    array: &ArrayValue,
    op: ArithOp,
    mut combine: impl FnMut(usize, Primitive) -> IrResult<Primitive>,
) -> IrResult<ArrayValue> {
    let mut result = ArrayValue::new(array.element_kind());
    for (i, element) in array.elements().iter().enumerate() {
        let combined = combine(i, *element).map_err(|err| match err {
            IrError::InvalidValueArithmetic { category, .. } => IrError::InvalidValueArithmetic {
                op: op.to_string(),
                category: format!("array element {i} ({category})"),
            },
            other => other,
        })?;
        result.push(combined);
    }
    Ok(result)
}

impl Value {
    fn is_arithmetic(&self) -> bool {
        matches!(
            self.data,
            ValueData::Builtin(_) | ValueData::Array(_) | ValueData::Reference(_)
        )
    }

    /// Apply a binary operator, producing a new value
    pub fn binary(&self, op: ArithOp, rhs: &Value) -> IrResult<Value> {
        match (&self.data, &rhs.data) {
            (ValueData::Reference(inner), _) => inner.binary(op, rhs),
            (_, ValueData::Reference(inner)) => self.binary(op, inner),
            (ValueData::Builtin(a), ValueData::Builtin(b)) => Ok(Value::from_primitive(a.binary(op, *b)?)),
            (ValueData::Array(a), ValueData::Array(b)) => {
                if a.len() != b.len() {
                    return Err(IrError::invalid_arithmetic(
                        op,
                        format!("arrays of length {} and {}", a.len(), b.len()),
                    ));
                }
                let result = elementwise(a, op, |i, x| x.binary(op, b.elements()[i]))?;
                Ok(Value::new(self.facade.clone(), ValueData::Array(result)))
            }
            (ValueData::Array(a), ValueData::Builtin(b)) => {
                let result = elementwise(a, op, |_, x| x.binary(op, *b))?;
                Ok(Value::new(self.facade.clone(), ValueData::Array(result)))
            }
            (ValueData::Builtin(a), ValueData::Array(b)) => {
                let result = elementwise(b, op, |_, x| a.binary(op, x))?;
                Ok(Value::new(rhs.facade.clone(), ValueData::Array(result)))
            }
            _ => {
                let offender = if self.is_arithmetic() { rhs } else { self };
                Err(IrError::invalid_arithmetic(op, offender.category()))
            }
        }
    }

    fn step(&mut self, increment: bool) -> IrResult<()> {
        let category = self.category();
        let op = if increment { "++" } else { "--" };
        match &mut self.data {
            ValueData::Builtin(primitive) => primitive.step(increment),
            ValueData::Array(array) => {
                if !increment && array.element_kind() == PrimitiveKind::Bool {
                    return Err(IrError::invalid_arithmetic(op, "bool array"));
                }
                array
                    .elements_mut()
                    .iter_mut()
                    .try_for_each(|element| element.step(increment))
            }
            ValueData::Reference(inner) => inner.step(increment),
            ValueData::Offset(offset) => {
                if increment {
                    offset.increment();
                    Ok(())
                } else {
                    offset.decrement()
                }
            }
            ValueData::Nil | ValueData::Record(_) | ValueData::Pointer => {
                Err(IrError::invalid_arithmetic(op, category))
            }
        }
    }

    /// `++v`
    pub fn pre_increment(&mut self) -> IrResult<&Value> {
        self.step(true)?;
        Ok(self)
    }

    /// `--v`
    pub fn pre_decrement(&mut self) -> IrResult<&Value> {
        self.step(false)?;
        Ok(self)
    }

    /// `v++`, returning the value before the step
    pub fn post_increment(&mut self) -> IrResult<Value> {
        let previous = self.clone();
        self.step(true)?;
        Ok(previous)
    }

    /// `v--`, returning the value before the step
    pub fn post_decrement(&mut self) -> IrResult<Value> {
        let previous = self.clone();
        self.step(false)?;
        Ok(previous)
    }
}

macro_rules! value_operator {
    ($trait:ident, $method:ident, $op:ident) => {
        impl ops::$trait<&Value> for &Value {
            type Output = IrResult<Value>;

            fn $method(self, rhs: &Value) -> IrResult<Value> {
                self.binary(ArithOp::$op, rhs)
            }
        }
    };
}

value_operator!(Add, add, Add);
value_operator!(Sub, sub, Sub);
value_operator!(Mul, mul, Mul);
value_operator!(Div, div, Div);
value_operator!(Rem, rem, Rem);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::{RecordSpecifier, RecordType, Type, TypeFacade};
    use crate::value::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_operators() {
        assert_eq!((&make_int(7) + &make_int(5)).unwrap(), make_int(12));
        assert_eq!((&make_int(7) % &make_int(5)).unwrap(), make_int(2));
        assert_eq!((&make_char(2) * &make_double(1.25)).unwrap(), make_double(2.5));
        assert_eq!((&make_uint(1) - &make_int(2)).unwrap(), make_uint(u32::MAX));
        assert!(matches!(
            &make_long(1) / &make_long(0),
            Err(IrError::InvalidValueArithmetic { .. })
        ));
    }

    #[test]
    fn test_array_elementwise_and_broadcast() {
        let a = make_array([1i32, 2, 3]);
        let b = make_array([10i32, 20, 30]);
        assert_eq!((&a + &b).unwrap(), make_array([11i32, 22, 33]));
        assert_eq!((&a * &make_int(2)).unwrap(), make_array([2i32, 4, 6]));
        assert_eq!((&make_int(10) - &a).unwrap(), make_array([9i32, 8, 7]));

        // Results keep the array's element kind
        let bytes = make_array([250u8, 251]);
        let sum = (&bytes + &make_int(10)).unwrap();
        assert_eq!(sum, make_array([4u8, 5]));

        let short = make_array([1i32]);
        assert!(matches!(
            &a + &short,
            Err(IrError::InvalidValueArithmetic { .. })
        ));
    }

    #[test]
    fn test_reference_delegates() {
        let reference = make_reference(make_int(40));
        assert_eq!((&reference + &make_int(2)).unwrap(), make_int(42));
        assert_eq!((&make_int(2) + &reference).unwrap(), make_int(42));
    }

    #[test]
    fn test_categories_without_arithmetic() {
        let record = make_record(TypeFacade::from_type(Type::record(RecordType::new(
            "s",
            RecordSpecifier::Struct,
        ))));
        let target = make_array([1i32]).into_handle();
        let rejected = [
            make_nil(),
            record,
            make_pointer(TypeFacade::from_type(Type::builtin(crate::typesys::Specifier::Int)).with_pointer(1)),
            make_offset(&target, 0),
        ];
        for value in &rejected {
            let err = (value + &make_int(1)).unwrap_err();
            assert_eq!(err, IrError::invalid_arithmetic("+", value.category()));
            let err = (&make_int(1) * value).unwrap_err();
            assert_eq!(err, IrError::invalid_arithmetic("*", value.category()));
        }
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut counter = make_int(1);
        assert_eq!(counter.post_increment().unwrap(), make_int(1));
        assert_eq!(counter.pre_increment().unwrap(), &make_int(3));
        counter.pre_decrement().unwrap();
        assert_eq!(counter, make_int(2));

        let mut flag = make_bool(false);
        flag.pre_increment().unwrap();
        assert_eq!(flag, make_bool(true));
        assert!(flag.post_decrement().is_err());

        let mut nil = make_nil();
        assert_eq!(
            nil.pre_increment().unwrap_err(),
            IrError::invalid_arithmetic("++", "nil")
        );
    }

    #[test]
    fn test_offset_steps() {
        let target = make_array([5i32, 6]).into_handle();
        let mut cursor = make_offset(&target, 0);
        cursor.pre_increment().unwrap();
        match cursor.data() {
            ValueData::Offset(offset) => assert_eq!(offset.deref(), Ok(make_int(6))),
            other => panic!("expected offset, got {other:?}"),
        }
        cursor.pre_decrement().unwrap();
        assert!(matches!(
            cursor.pre_decrement(),
            Err(IrError::OutOfBounds { .. })
        ));
    }
}
