//! Operator definitions carried by expression nodes

use crate::value::ArithOp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add, Sub, Mul, Div, Mod,

    // Bitwise
    BitAnd, BitOr, BitXor, LeftShift, RightShift,

    // Logical
    LogicalAnd, LogicalOr,

    // Comparison
    Equal, NotEqual, Less, Greater, LessEqual, GreaterEqual,

    // Assignment
    Assign,
    AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,

    // Array/pointer access
    Index,
}

impl BinaryOp {
    const ALL: [BinaryOp; 25] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::LeftShift,
        BinaryOp::RightShift,
        BinaryOp::LogicalAnd,
        BinaryOp::LogicalOr,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::Less,
        BinaryOp::Greater,
        BinaryOp::LessEqual,
        BinaryOp::GreaterEqual,
        BinaryOp::Assign,
        BinaryOp::AddAssign,
        BinaryOp::SubAssign,
        BinaryOp::MulAssign,
        BinaryOp::DivAssign,
        BinaryOp::ModAssign,
        BinaryOp::Index,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// The value operator this node folds to, if it is plain arithmetic
    pub fn arith(self) -> Option<ArithOp> {
        match self {
            BinaryOp::Add => Some(ArithOp::Add),
            BinaryOp::Sub => Some(ArithOp::Sub),
            BinaryOp::Mul => Some(ArithOp::Mul),
            BinaryOp::Div => Some(ArithOp::Div),
            BinaryOp::Mod => Some(ArithOp::Rem),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::Index => "[]",
        };
        write!(f, "{}", op_str)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus, Minus,
    BitNot,
    LogicalNot,
    Dereference, AddressOf,
    PreIncrement, PostIncrement,
    PreDecrement, PostDecrement,
    Sizeof,
}

impl UnaryOp {
    const ALL: [UnaryOp; 11] = [
        UnaryOp::Plus,
        UnaryOp::Minus,
        UnaryOp::BitNot,
        UnaryOp::LogicalNot,
        UnaryOp::Dereference,
        UnaryOp::AddressOf,
        UnaryOp::PreIncrement,
        UnaryOp::PostIncrement,
        UnaryOp::PreDecrement,
        UnaryOp::PostDecrement,
        UnaryOp::Sizeof,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogicalNot => "!",
            UnaryOp::Dereference => "*",
            UnaryOp::AddressOf => "&",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
            UnaryOp::Sizeof => "sizeof",
        };
        write!(f, "{}", op_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_display() {
        assert_eq!(format!("{}", BinaryOp::Add), "+");
        assert_eq!(format!("{}", BinaryOp::Equal), "==");
        assert_eq!(format!("{}", BinaryOp::Index), "[]");
    }

    #[test]
    fn test_op_tags() {
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_tag(op.tag()), Some(op));
        }
        for op in UnaryOp::ALL {
            assert_eq!(UnaryOp::from_tag(op.tag()), Some(op));
        }
        assert_eq!(BinaryOp::from_tag(25), None);
        assert_eq!(UnaryOp::from_tag(11), None);
    }

    #[test]
    fn test_arith_mapping() {
        assert_eq!(BinaryOp::Mod.arith(), Some(ArithOp::Rem));
        assert_eq!(BinaryOp::Less.arith(), None);
    }
}
