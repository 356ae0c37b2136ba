//! Array values: a homogeneous run of primitives

use super::primitive::{Primitive, PrimitiveKind};
use cir_common::{IrError, IrResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    element: PrimitiveKind,
    elements: Vec<Primitive>,
}

impl ArrayValue {
    pub fn new(element: PrimitiveKind) -> Self {
        Self {
            element,
            elements: Vec::new(),
        }
    }

    /// Build from primitives, converting each to `element`
    pub fn from_elements(element: PrimitiveKind, elements: impl IntoIterator<Item = Primitive>) -> Self {
        Self {
            element,
            elements: elements.into_iter().map(|p| p.convert(element)).collect(),
        }
    }

    pub fn zeroed(element: PrimitiveKind, len: usize) -> Self {
        Self {
            element,
            elements: vec![element.zero(); len],
        }
    }

    pub fn element_kind(&self) -> PrimitiveKind {
        self.element
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Primitive] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [Primitive] {
        &mut self.elements
    }

    pub fn get(&self, index: usize) -> IrResult<Primitive> {
        self.elements.get(index).copied().ok_or(IrError::OutOfBounds {
            index,
            size: self.elements.len(),
        })
    }

    pub fn set(&mut self, index: usize, value: Primitive) -> IrResult<()> {
        let size = self.elements.len();
        let slot = self
            .elements
            .get_mut(index)
            .ok_or(IrError::OutOfBounds { index, size })?;
        *slot = value.convert(self.element);
        Ok(())
    }

    pub fn push(&mut self, value: Primitive) {
        self.elements.push(value.convert(self.element));
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, "]")
    }
}
