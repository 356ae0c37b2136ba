//! Type facades
//!
//! A facade bundles a shared base type with pointer and array modifiers
//! that apply at this use site only (`int *p`, `int a[4]`), leaving the
//! shared [`Type`] untouched.

use crate::typesys::{Specifier, Type};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeFacade {
    ty: Rc<Type>,
    pointer: u32,
    array: u32,
}

impl TypeFacade {
    pub fn new(ty: Rc<Type>) -> Self {
        Self {
            ty,
            pointer: 0,
            array: 0,
        }
    }

    pub fn from_type(ty: Type) -> Self {
        Self::new(Rc::new(ty))
    }

    pub fn builtin(specifier: Specifier) -> Self {
        Self::from_type(Type::builtin(specifier))
    }

    pub fn nil() -> Self {
        Self::from_type(Type::nil())
    }

    pub fn with_pointer(mut self, indirection: u32) -> Self {
        self.pointer = indirection;
        self
    }

    pub fn with_array(mut self, elements: u32) -> Self {
        self.array = elements;
        self
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The shared handle, for attaching the same type elsewhere
    pub fn shared(&self) -> &Rc<Type> {
        &self.ty
    }

    /// Mutable access to the base type. A type shared with other owners is
    /// cloned first, so edits never leak into them.
    pub fn type_mut(&mut self) -> &mut Type {
        Rc::make_mut(&mut self.ty)
    }

    pub fn pointer_count(&self) -> u32 {
        self.pointer
    }

    pub fn array_count(&self) -> u32 {
        self.array
    }

    pub fn set_pointer_count(&mut self, indirection: u32) {
        self.pointer = indirection;
    }

    pub fn set_array_count(&mut self, elements: u32) {
        self.array = elements;
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer > 0
    }

    pub fn is_array(&self) -> bool {
        self.array > 0
    }

    /// Equality including the modifiers and the type trailer
    pub fn identical(&self, other: &TypeFacade) -> bool {
        self.pointer == other.pointer && self.array == other.array && self.ty.identical(&other.ty)
    }

    pub fn size_in_bytes(&self) -> Option<u64> {
        let unit = if self.is_pointer() {
            Some(Type::POINTER_SIZE)
        } else {
            self.ty.size_in_bytes()
        }?;
        if self.is_array() {
            unit.checked_mul(u64::from(self.array))
        } else {
            Some(unit)
        }
    }
}

/// Facades compare their base types only; pointer and array modifiers are
/// not part of facade equality.
impl PartialEq for TypeFacade {
    fn eq(&self, other: &Self) -> bool {
        *self.ty == *other.ty
    }
}

impl From<Type> for TypeFacade {
    fn from(ty: Type) -> Self {
        Self::from_type(ty)
    }
}

impl From<Rc<Type>> for TypeFacade {
    fn from(ty: Rc<Type>) -> Self {
        Self::new(ty)
    }
}

impl fmt::Display for TypeFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        for _ in 0..self.pointer {
            write!(f, "*")?;
        }
        if self.array > 0 {
            write!(f, "[{}]", self.array)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::TypeQualifier;

    #[test]
    fn test_modifiers_ignored_by_equality() {
        let plain = TypeFacade::builtin(Specifier::Int);
        let pointer = TypeFacade::builtin(Specifier::Int).with_pointer(2);
        let array = TypeFacade::builtin(Specifier::Int).with_array(8);

        // Facade equality only looks at the base type, even though these
        // denote different C types.
        assert_eq!(plain, pointer);
        assert_eq!(plain, array);
        assert!(!plain.identical(&pointer));
        assert!(!plain.identical(&array));
        assert_ne!(plain, TypeFacade::builtin(Specifier::Char));
    }

    #[test]
    fn test_type_mut_clones_shared_type() {
        let shared = Rc::new(Type::builtin(Specifier::Int));
        let mut first = TypeFacade::new(Rc::clone(&shared));
        let second = TypeFacade::new(Rc::clone(&shared));

        first.type_mut().add_qualifier(TypeQualifier::Const);

        assert!(first.ty().has_qualifier(TypeQualifier::Const));
        assert!(!second.ty().has_qualifier(TypeQualifier::Const));
        assert!(!shared.has_qualifier(TypeQualifier::Const));
        assert!(Rc::ptr_eq(second.shared(), &shared));
    }

    #[test]
    fn test_display_and_size() {
        let facade = TypeFacade::builtin(Specifier::Char).with_pointer(1);
        assert_eq!(facade.to_string(), "char*");
        assert_eq!(facade.size_in_bytes(), Some(8));

        let array = TypeFacade::builtin(Specifier::Int).with_array(4);
        assert_eq!(array.to_string(), "int[4]");
        assert_eq!(array.size_in_bytes(), Some(16));
    }
}
