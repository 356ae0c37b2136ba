//! Primitive storage for builtin values
//!
//! Builtin and array values hold [`Primitive`]s. Arithmetic between two
//! primitives follows the usual arithmetic conversions: both operands are
//! promoted to the higher-ranked kind (never below `i32`), integers wrap and
//! integer division by zero is rejected.

use super::arith::ArithOp;
use crate::typesys::Specifier;
use cir_common::{IrError, IrResult};
use cir_wire::{ByteStream, WireError, WireResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive kinds, declared in conversion rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool = 1,
    I8 = 2,
    U8 = 3,
    I16 = 4,
    U16 = 5,
    I32 = 6,
    U32 = 7,
    I64 = 8,
    U64 = 9,
    F32 = 10,
    F64 = 11,
}

impl PrimitiveKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        use PrimitiveKind::*;
        Some(match tag {
            1 => Bool,
            2 => I8,
            3 => U8,
            4 => I16,
            5 => U16,
            6 => I32,
            7 => U32,
            8 => I64,
            9 => U64,
            10 => F32,
            11 => F64,
            _ => return None,
        })
    }

    /// Encoded width in bytes
    pub fn size(self) -> usize {
        use PrimitiveKind::*;
        match self {
            Bool | I8 | U8 => 1,
            I16 | U16 => 2,
            I32 | U32 | F32 => 4,
            I64 | U64 | F64 => 8,
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    /// Storage kind of a builtin specifier; `void` has none
    pub fn from_specifier(specifier: Specifier) -> Option<Self> {
        use PrimitiveKind::*;
        Some(match specifier {
            Specifier::Void => return None,
            Specifier::Bool => Bool,
            Specifier::Char | Specifier::SignedChar => I8,
            Specifier::UnsignedChar => U8,
            Specifier::Short => I16,
            Specifier::UnsignedShort => U16,
            Specifier::Int => I32,
            Specifier::UnsignedInt => U32,
            Specifier::Long | Specifier::LongLong => I64,
            Specifier::UnsignedLong | Specifier::UnsignedLongLong => U64,
            Specifier::Float => F32,
            Specifier::Double | Specifier::LongDouble => F64,
        })
    }

    /// Canonical C specifier for values of this kind
    pub fn specifier(self) -> Specifier {
        use PrimitiveKind::*;
        match self {
            Bool => Specifier::Bool,
            I8 => Specifier::Char,
            U8 => Specifier::UnsignedChar,
            I16 => Specifier::Short,
            U16 => Specifier::UnsignedShort,
            I32 => Specifier::Int,
            U32 => Specifier::UnsignedInt,
            I64 => Specifier::Long,
            U64 => Specifier::UnsignedLong,
            F32 => Specifier::Float,
            F64 => Specifier::Double,
        }
    }

    /// Kind both operands are converted to before a binary operation
    pub fn common(self, other: PrimitiveKind) -> PrimitiveKind {
        self.max(other).max(PrimitiveKind::I32)
    }

    pub fn zero(self) -> Primitive {
        Primitive::I32(0).convert(self)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        };
        write!(f, "{name}")
    }
}

/// One builtin datum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

/// Apply `$body` to the payload of any integer primitive
macro_rules! with_integer {
    ($prim:expr, $v:ident => $body:expr, float $f:ident => $fbody:expr) => {
        match $prim {
            Primitive::Bool($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::I8($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::U8($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::I16($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::U16($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::I32($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::U32($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::I64($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::U64($v) => {
                let $v = i128::from($v);
                $body
            }
            Primitive::F32($f) => {
                let $f = f64::from($f);
                $fbody
            }
            Primitive::F64($f) => $fbody,
        }
    };
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::I8(_) => PrimitiveKind::I8,
            Primitive::U8(_) => PrimitiveKind::U8,
            Primitive::I16(_) => PrimitiveKind::I16,
            Primitive::U16(_) => PrimitiveKind::U16,
            Primitive::I32(_) => PrimitiveKind::I32,
            Primitive::U32(_) => PrimitiveKind::U32,
            Primitive::I64(_) => PrimitiveKind::I64,
            Primitive::U64(_) => PrimitiveKind::U64,
            Primitive::F32(_) => PrimitiveKind::F32,
            Primitive::F64(_) => PrimitiveKind::F64,
        }
    }

    /// Integer payload, widened. `None` for floats.
    pub fn as_integer(&self) -> Option<i128> {
        with_integer!(*self, v => Some(v), float _f => None)
    }

    pub fn as_f64(&self) -> f64 {
        with_integer!(*self, v => v as f64, float f => f)
    }

    pub fn is_zero(&self) -> bool {
        with_integer!(*self, v => v == 0, float f => f == 0.0)
    }

    /// C conversion to another kind: integers truncate, floats truncate
    /// toward zero, anything non-zero becomes `true`.
    pub fn convert(self, kind: PrimitiveKind) -> Primitive {
        if self.kind() == kind {
            return self;
        }
        if kind == PrimitiveKind::Bool {
            return Primitive::Bool(!self.is_zero());
        }
        match self.as_integer() {
            Some(v) => match kind {
                PrimitiveKind::Bool => Primitive::Bool(v != 0),
                PrimitiveKind::I8 => Primitive::I8(v as i8),
                PrimitiveKind::U8 => Primitive::U8(v as u8),
                PrimitiveKind::I16 => Primitive::I16(v as i16),
                PrimitiveKind::U16 => Primitive::U16(v as u16),
                PrimitiveKind::I32 => Primitive::I32(v as i32),
                PrimitiveKind::U32 => Primitive::U32(v as u32),
                PrimitiveKind::I64 => Primitive::I64(v as i64),
                PrimitiveKind::U64 => Primitive::U64(v as u64),
                PrimitiveKind::F32 => Primitive::F32(v as f32),
                PrimitiveKind::F64 => Primitive::F64(v as f64),
            },
            None => {
                let f = self.as_f64();
                match kind {
                    PrimitiveKind::Bool => Primitive::Bool(f != 0.0),
                    PrimitiveKind::I8 => Primitive::I8(f as i8),
                    PrimitiveKind::U8 => Primitive::U8(f as u8),
                    PrimitiveKind::I16 => Primitive::I16(f as i16),
                    PrimitiveKind::U16 => Primitive::U16(f as u16),
                    PrimitiveKind::I32 => Primitive::I32(f as i32),
                    PrimitiveKind::U32 => Primitive::U32(f as u32),
                    PrimitiveKind::I64 => Primitive::I64(f as i64),
                    PrimitiveKind::U64 => Primitive::U64(f as u64),
                    PrimitiveKind::F32 => Primitive::F32(f as f32),
                    PrimitiveKind::F64 => Primitive::F64(f),
                }
            }
        }
    }

    /// Binary arithmetic after the usual arithmetic conversions
    pub fn binary(self, op: ArithOp, rhs: Primitive) -> IrResult<Primitive> {
        let kind = self.kind().common(rhs.kind());
        let (lhs, rhs) = (self.convert(kind), rhs.convert(kind));

        macro_rules! integer {
            ($variant:ident, $a:expr, $b:expr) => {{
                let (a, b) = ($a, $b);
                if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0 {
                    return Err(IrError::invalid_arithmetic(
                        format!("{op} by zero"),
                        "builtin",
                    ));
                }
                Primitive::$variant(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                    ArithOp::Div => a.wrapping_div(b),
                    ArithOp::Rem => a.wrapping_rem(b),
                })
            }};
        }

        macro_rules! floating {
            ($variant:ident, $a:expr, $b:expr) => {{
                let (a, b) = ($a, $b);
                Primitive::$variant(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Rem => {
                        return Err(IrError::invalid_arithmetic(op, kind));
                    }
                })
            }};
        }

        Ok(match (lhs, rhs) {
            (Primitive::I32(a), Primitive::I32(b)) => integer!(I32, a, b),
            (Primitive::U32(a), Primitive::U32(b)) => integer!(U32, a, b),
            (Primitive::I64(a), Primitive::I64(b)) => integer!(I64, a, b),
            (Primitive::U64(a), Primitive::U64(b)) => integer!(U64, a, b),
            (Primitive::F32(a), Primitive::F32(b)) => floating!(F32, a, b),
            (Primitive::F64(a), Primitive::F64(b)) => floating!(F64, a, b),
            (a, b) => {
                return Err(IrError::invalid_arithmetic(
                    op,
                    format!("{} and {}", a.kind(), b.kind()),
                ))
            }
        })
    }

    /// `++` / `--` in place, without promotion. Decrementing a bool is
    /// rejected; incrementing one sets it.
    pub fn step(&mut self, increment: bool) -> IrResult<()> {
        macro_rules! step {
            ($v:expr) => {
                *$v = if increment {
                    $v.wrapping_add(1)
                } else {
                    $v.wrapping_sub(1)
                }
            };
        }
        let delta = if increment { 1.0 } else { -1.0 };
        match self {
            Primitive::Bool(v) if increment => *v = true,
            Primitive::Bool(_) => return Err(IrError::invalid_arithmetic("--", "bool")),
            Primitive::I8(v) => step!(v),
            Primitive::U8(v) => step!(v),
            Primitive::I16(v) => step!(v),
            Primitive::U16(v) => step!(v),
            Primitive::I32(v) => step!(v),
            Primitive::U32(v) => step!(v),
            Primitive::I64(v) => step!(v),
            Primitive::U64(v) => step!(v),
            Primitive::F32(v) => *v += delta as f32,
            Primitive::F64(v) => *v += delta,
        }
        Ok(())
    }

    /// Write the raw bytes, without the kind tag
    pub fn encode_raw(&self, stream: &mut ByteStream) {
        match *self {
            Primitive::Bool(v) => stream.put_bool(v),
            Primitive::I8(v) => stream.put_byte(v as u8),
            Primitive::U8(v) => stream.put_byte(v),
            Primitive::I16(v) => stream.put_short(v as u16),
            Primitive::U16(v) => stream.put_short(v),
            Primitive::I32(v) => stream.put_word(v as u32),
            Primitive::U32(v) => stream.put_word(v),
            Primitive::I64(v) => stream.put_dword(v as u64),
            Primitive::U64(v) => stream.put_dword(v),
            Primitive::F32(v) => stream.put_word(v.to_bits()),
            Primitive::F64(v) => stream.put_dword(v.to_bits()),
        }
    }

    pub fn decode_raw(kind: PrimitiveKind, stream: &mut ByteStream) -> WireResult<Primitive> {
        Ok(match kind {
            PrimitiveKind::Bool => Primitive::Bool(stream.get_bool()?),
            PrimitiveKind::I8 => Primitive::I8(stream.get_byte()? as i8),
            PrimitiveKind::U8 => Primitive::U8(stream.get_byte()?),
            PrimitiveKind::I16 => Primitive::I16(stream.get_short()? as i16),
            PrimitiveKind::U16 => Primitive::U16(stream.get_short()?),
            PrimitiveKind::I32 => Primitive::I32(stream.get_word()? as i32),
            PrimitiveKind::U32 => Primitive::U32(stream.get_word()?),
            PrimitiveKind::I64 => Primitive::I64(stream.get_dword()? as i64),
            PrimitiveKind::U64 => Primitive::U64(stream.get_dword()?),
            PrimitiveKind::F32 => Primitive::F32(f32::from_bits(stream.get_word()?)),
            PrimitiveKind::F64 => Primitive::F64(f64::from_bits(stream.get_dword()?)),
        })
    }

    /// Tagged form: kind byte then raw bytes
    pub fn encode(&self, stream: &mut ByteStream) {
        stream.put_byte(self.kind().tag());
        self.encode_raw(stream);
    }

    pub fn decode(stream: &mut ByteStream) -> WireResult<Primitive> {
        let kind = decode_kind(stream)?;
        Self::decode_raw(kind, stream)
    }
}

pub(crate) fn decode_kind(stream: &mut ByteStream) -> WireResult<PrimitiveKind> {
    let tag = stream.get_byte()?;
    PrimitiveKind::from_tag(tag).ok_or(WireError::unknown_tag("primitive", tag))
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(v) => write!(f, "{v}"),
            Primitive::I8(v) => write!(f, "{v}"),
            Primitive::U8(v) => write!(f, "{v}"),
            Primitive::I16(v) => write!(f, "{v}"),
            Primitive::U16(v) => write!(f, "{v}"),
            Primitive::I32(v) => write!(f, "{v}"),
            Primitive::U32(v) => write!(f, "{v}"),
            Primitive::I64(v) => write!(f, "{v}"),
            Primitive::U64(v) => write!(f, "{v}"),
            Primitive::F32(v) => write!(f, "{v}"),
            Primitive::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types a builtin value can be extracted as
pub trait BuiltinCast: Copy {
    const KIND: PrimitiveKind;

    fn into_primitive(self) -> Primitive;

    /// Lossless extraction; `None` when the value does not fit
    fn from_primitive(primitive: Primitive) -> Option<Self>;
}

macro_rules! integer_cast {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl BuiltinCast for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$variant;

                fn into_primitive(self) -> Primitive {
                    Primitive::$variant(self)
                }

                fn from_primitive(primitive: Primitive) -> Option<Self> {
                    primitive.as_integer().and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )*
    };
}

integer_cast! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

impl BuiltinCast for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Bool;

    fn into_primitive(self) -> Primitive {
        Primitive::Bool(self)
    }

    fn from_primitive(primitive: Primitive) -> Option<Self> {
        match primitive.as_integer()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl BuiltinCast for f32 {
    const KIND: PrimitiveKind = PrimitiveKind::F32;

    fn into_primitive(self) -> Primitive {
        Primitive::F32(self)
    }

    fn from_primitive(primitive: Primitive) -> Option<Self> {
        match primitive {
            Primitive::F32(v) => Some(v),
            Primitive::F64(v) => {
                let narrowed = v as f32;
                (f64::from(narrowed) == v || v.is_nan()).then_some(narrowed)
            }
            other => other.as_integer().and_then(|v| {
                let converted = v as f32;
                (converted as i128 == v).then_some(converted)
            }),
        }
    }
}

impl BuiltinCast for f64 {
    const KIND: PrimitiveKind = PrimitiveKind::F64;

    fn into_primitive(self) -> Primitive {
        Primitive::F64(self)
    }

    fn from_primitive(primitive: Primitive) -> Option<Self> {
        match primitive {
            Primitive::F32(v) => Some(f64::from(v)),
            Primitive::F64(v) => Some(v),
            other => other.as_integer().and_then(|v| {
                let converted = v as f64;
                (converted as i128 == v).then_some(converted)
            }),
        }
    }
}
