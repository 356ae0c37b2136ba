//! Builtin (arithmetic and void) types
//!
//! A builtin type is a specifier plus the option bits a C declaration
//! accumulates one keyword at a time (`signed`, `unsigned`, `short`,
//! `long`). The
//! front end creates one builtin per keyword and folds them together with
//! [`BuiltinType::consolidate`].

use cir_common::fatal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Builtin type specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specifier {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
}

impl Specifier {
    const ALL: [Specifier; 16] = [
        Specifier::Void,
        Specifier::Bool,
        Specifier::Char,
        Specifier::SignedChar,
        Specifier::UnsignedChar,
        Specifier::Short,
        Specifier::UnsignedShort,
        Specifier::Int,
        Specifier::UnsignedInt,
        Specifier::Long,
        Specifier::UnsignedLong,
        Specifier::LongLong,
        Specifier::UnsignedLongLong,
        Specifier::Float,
        Specifier::Double,
        Specifier::LongDouble,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// C spelling of the specifier
    pub fn name(self) -> &'static str {
        match self {
            Specifier::Void => "void",
            Specifier::Bool => "_Bool",
            Specifier::Char => "char",
            Specifier::SignedChar => "signed char",
            Specifier::UnsignedChar => "unsigned char",
            Specifier::Short => "short",
            Specifier::UnsignedShort => "unsigned short",
            Specifier::Int => "int",
            Specifier::UnsignedInt => "unsigned int",
            Specifier::Long => "long",
            Specifier::UnsignedLong => "unsigned long",
            Specifier::LongLong => "long long",
            Specifier::UnsignedLongLong => "unsigned long long",
            Specifier::Float => "float",
            Specifier::Double => "double",
            Specifier::LongDouble => "long double",
        }
    }

    /// Size in bytes under the LP64 data model
    pub fn size_in_bytes(self) -> Option<u64> {
        match self {
            Specifier::Void => None,
            Specifier::Bool | Specifier::Char | Specifier::SignedChar | Specifier::UnsignedChar => Some(1),
            Specifier::Short | Specifier::UnsignedShort => Some(2),
            Specifier::Int | Specifier::UnsignedInt | Specifier::Float => Some(4),
            Specifier::Long
            | Specifier::UnsignedLong
            | Specifier::LongLong
            | Specifier::UnsignedLongLong
            | Specifier::Double => Some(8),
            Specifier::LongDouble => Some(16),
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            Specifier::Void | Specifier::Float | Specifier::Double | Specifier::LongDouble
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Specifier::Float | Specifier::Double | Specifier::LongDouble)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Specifier::Bool
                | Specifier::UnsignedChar
                | Specifier::UnsignedShort
                | Specifier::UnsignedInt
                | Specifier::UnsignedLong
                | Specifier::UnsignedLongLong
        )
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Option bits accumulated from modifier keywords
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuiltinOptions {
    pub unsigned: bool,
    pub short: bool,
    pub long: bool,
    pub long_long: bool,
    pub signed: bool,
}

impl BuiltinOptions {
    pub const UNSIGNED: u8 = 0x01;
    pub const SHORT: u8 = 0x02;
    pub const LONG: u8 = 0x04;
    pub const LONG_LONG: u8 = 0x08;
    pub const SIGNED: u8 = 0x10;

    pub fn is_empty(&self) -> bool {
        !(self.unsigned || self.short || self.long || self.long_long || self.signed)
    }

    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.unsigned {
            bits |= Self::UNSIGNED;
        }
        if self.short {
            bits |= Self::SHORT;
        }
        if self.long {
            bits |= Self::LONG;
        }
        if self.long_long {
            bits |= Self::LONG_LONG;
        }
        if self.signed {
            bits |= Self::SIGNED;
        }
        bits
    }

    /// Unknown bits are ignored
    pub fn from_bits(bits: u8) -> Self {
        Self {
            unsigned: bits & Self::UNSIGNED != 0,
            short: bits & Self::SHORT != 0,
            long: bits & Self::LONG != 0,
            long_long: bits & Self::LONG_LONG != 0,
            signed: bits & Self::SIGNED != 0,
        }
    }
}

/// Payload of the builtin type variant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BuiltinType {
    specifier: Specifier,
    options: BuiltinOptions,
}

impl BuiltinType {
    pub fn new(specifier: Specifier) -> Self {
        Self {
            specifier,
            options: BuiltinOptions::default(),
        }
    }

    pub fn with_options(specifier: Specifier, options: BuiltinOptions) -> Self {
        Self { specifier, options }
    }

    /// Builtin for a single declaration keyword. Modifier keywords produce a
    /// placeholder `int` carrying the modifier bit.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let modifier = |options: BuiltinOptions| Self::with_options(Specifier::Int, options);
        Some(match keyword {
            "void" => Self::new(Specifier::Void),
            "_Bool" | "bool" => Self::new(Specifier::Bool),
            "char" => Self::new(Specifier::Char),
            "int" => Self::new(Specifier::Int),
            "float" => Self::new(Specifier::Float),
            "double" => Self::new(Specifier::Double),
            "signed" => modifier(BuiltinOptions {
                signed: true,
                ..Default::default()
            }),
            "unsigned" => modifier(BuiltinOptions {
                unsigned: true,
                ..Default::default()
            }),
            "short" => modifier(BuiltinOptions {
                short: true,
                ..Default::default()
            }),
            "long" => modifier(BuiltinOptions {
                long: true,
                ..Default::default()
            }),
            _ => return None,
        })
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn options(&self) -> BuiltinOptions {
        self.options
    }

    /// A builtin accepts further keywords only once it carries a modifier
    pub fn allow_coalescence(&self) -> bool {
        !self.options.is_empty()
    }

    /// Fold another keyword's builtin into this one. `long` + `long` becomes
    /// `long long`; `unsigned` is never cleared once set.
    pub fn consolidate(&mut self, other: &BuiltinType) {
        if !self.allow_coalescence() {
            fatal!(
                "cannot consolidate '{}' into non-coalescible builtin '{}'",
                other.effective_specifier(),
                self.effective_specifier()
            );
        }

        if other.options.long_long {
            self.options.long = false;
            self.options.long_long = true;
        } else if other.options.long {
            if self.options.long {
                self.options.long = false;
                self.options.long_long = true;
            } else if !self.options.long_long {
                self.options.long = true;
            }
        }

        self.options.unsigned |= other.options.unsigned;
        self.options.signed |= other.options.signed;
        self.options.short |= other.options.short;

        if self.specifier == Specifier::Int && other.specifier != Specifier::Int {
            self.specifier = other.specifier;
        }
    }

    /// The concrete specifier once option bits are applied
    pub fn effective_specifier(&self) -> Specifier {
        let BuiltinOptions {
            unsigned,
            short,
            long,
            long_long,
            signed,
        } = self.options;

        match self.specifier {
            Specifier::Int | Specifier::UnsignedInt => {
                let unsigned = unsigned || self.specifier == Specifier::UnsignedInt;
                match (short, long, long_long, unsigned) {
                    (true, _, _, false) => Specifier::Short,
                    (true, _, _, true) => Specifier::UnsignedShort,
                    (_, _, true, false) => Specifier::LongLong,
                    (_, _, true, true) => Specifier::UnsignedLongLong,
                    (_, true, _, false) => Specifier::Long,
                    (_, true, _, true) => Specifier::UnsignedLong,
                    (_, _, _, false) => Specifier::Int,
                    (_, _, _, true) => Specifier::UnsignedInt,
                }
            }
            Specifier::Char if unsigned => Specifier::UnsignedChar,
            Specifier::Char if signed => Specifier::SignedChar,
            Specifier::Short if unsigned => Specifier::UnsignedShort,
            Specifier::Long if long || long_long => {
                if unsigned {
                    Specifier::UnsignedLongLong
                } else {
                    Specifier::LongLong
                }
            }
            Specifier::Long if unsigned => Specifier::UnsignedLong,
            Specifier::LongLong if unsigned => Specifier::UnsignedLongLong,
            Specifier::Double if long => Specifier::LongDouble,
            other => other,
        }
    }

    pub fn size_in_bytes(&self) -> Option<u64> {
        self.effective_specifier().size_in_bytes()
    }
}

/// Builtins are equal when they denote the same concrete type, so
/// `long int` equals `long`.
impl PartialEq for BuiltinType {
    fn eq(&self, other: &Self) -> bool {
        self.effective_specifier() == other.effective_specifier()
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.effective_specifier())
    }
}
