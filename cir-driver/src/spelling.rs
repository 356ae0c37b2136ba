//! Builds a type from C declaration keywords such as `static const unsigned long`

use cir_ir::typesys::{BuiltinType, StorageClass, TypeQualifier};
use cir_ir::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpellingError {
    Empty,
    UnknownKeyword(String),
    Conflict(String),
}

impl fmt::Display for SpellingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpellingError::Empty => write!(f, "no type specifier given"),
            SpellingError::UnknownKeyword(word) => write!(f, "unknown keyword '{word}'"),
            SpellingError::Conflict(word) => write!(f, "'{word}' conflicts with the preceding specifiers"),
        }
    }
}

impl std::error::Error for SpellingError {}

pub fn parse_type<'a>(words: impl IntoIterator<Item = &'a str>) -> Result<Type, SpellingError> {
    let mut builtin: Option<Type> = None;
    let mut storage = StorageClass::None;
    let mut qualifiers = Vec::new();

    for word in words {
        match word {
            "auto" => storage = StorageClass::Auto,
            "static" => storage = StorageClass::Static,
            "extern" => storage = StorageClass::Extern,
            "register" => storage = StorageClass::Register,
            "const" => qualifiers.push(TypeQualifier::Const),
            "volatile" => qualifiers.push(TypeQualifier::Volatile),
            _ => {
                let next = BuiltinType::from_keyword(word)
                    .map(Type::from_builtin)
                    .ok_or_else(|| SpellingError::UnknownKeyword(word.to_string()))?;
                builtin = Some(match builtin {
                    None => next,
                    Some(mut current) if current.allow_coalescence() => {
                        current.consolidate(&next);
                        current
                    }
                    Some(current) if next.allow_coalescence() => {
                        let mut next = next;
                        next.consolidate(&current);
                        next
                    }
                    Some(_) => return Err(SpellingError::Conflict(word.to_string())),
                });
            }
        }
    }

    let mut ty = builtin.ok_or(SpellingError::Empty)?;
    ty.set_storage(storage);
    for qualifier in qualifiers {
        ty.add_qualifier(qualifier);
    }
    Ok(ty)
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
