//! Record (struct/union/class) types
//!
//! The record type owns the field list, which makes it the authority for
//! resolving a field name to its offset. Record values only store fields by
//! offset.

use crate::typesys::facade::TypeFacade;
use cir_common::{IrError, IrResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// struct, union or class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordSpecifier {
    Struct,
    Union,
    Class,
}

impl RecordSpecifier {
    pub fn tag(self) -> u8 {
        match self {
            RecordSpecifier::Struct => 0,
            RecordSpecifier::Union => 1,
            RecordSpecifier::Class => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(RecordSpecifier::Struct),
            1 => Some(RecordSpecifier::Union),
            2 => Some(RecordSpecifier::Class),
            _ => None,
        }
    }
}

impl fmt::Display for RecordSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSpecifier::Struct => write!(f, "struct"),
            RecordSpecifier::Union => write!(f, "union"),
            RecordSpecifier::Class => write!(f, "class"),
        }
    }
}

/// A named field of a record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub facade: TypeFacade,
}

/// Payload of the record type variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    name: String,
    specifier: RecordSpecifier,
    fields: Vec<RecordField>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, specifier: RecordSpecifier) -> Self {
        Self {
            name: name.into(),
            specifier,
            fields: Vec::new(),
        }
    }

    pub fn anonymous(specifier: RecordSpecifier) -> Self {
        Self::new(String::new(), specifier)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn specifier(&self) -> RecordSpecifier {
        self.specifier
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Append a field, returning its offset
    pub fn add_field(&mut self, name: impl Into<String>, facade: TypeFacade) -> IrResult<usize> {
        let name = name.into();
        if self.field_offset(&name).is_some() {
            return Err(IrError::FieldExists { name });
        }
        self.fields.push(RecordField { name, facade });
        Ok(self.fields.len() - 1)
    }

    /// Builder form of [`RecordType::add_field`]
    pub fn with_field(mut self, name: impl Into<String>, facade: TypeFacade) -> IrResult<Self> {
        self.add_field(name, facade)?;
        Ok(self)
    }

    pub fn field_offset(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, offset: usize) -> IrResult<&RecordField> {
        self.fields.get(offset).ok_or(IrError::OutOfBounds {
            index: offset,
            size: self.fields.len(),
        })
    }

    pub(crate) fn push_decoded(&mut self, field: RecordField) {
        self.fields.push(field);
    }

    /// Struct and class sizes are the sum of the fields, unions the widest
    pub fn size_in_bytes(&self) -> Option<u64> {
        let mut sizes = self.fields.iter().map(|field| field.facade.size_in_bytes());
        match self.specifier {
            RecordSpecifier::Union => sizes.try_fold(0u64, |max, size| size.map(|s| max.max(s))),
            RecordSpecifier::Struct | RecordSpecifier::Class => {
                sizes.try_fold(0u64, |total, size| size.and_then(|s| total.checked_add(s)))
            }
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "{} <anonymous>", self.specifier)
        } else {
            write!(f, "{} {}", self.specifier, self.name)
        }
    }
}
