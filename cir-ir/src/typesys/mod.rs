//! Type registry for the C IR
//!
//! Every type is one variant of a closed set behind a single [`Type`]
//! handle. The variant is fixed at construction; only the common trailer
//! (inline, sensitive, storage class, qualifiers) and builtin option bits can
//! change afterwards. Types are shared through `Rc<Type>` and cloned on
//! write.

pub mod builtin;
pub mod facade;
pub mod record;
mod wire;

pub use builtin::{BuiltinOptions, BuiltinType, Specifier};
pub use facade::TypeFacade;
pub use record::{RecordField, RecordSpecifier, RecordType};
pub use wire::MAX_TYPE_DEPTH;

use cir_common::fatal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Envelope tag of each type variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVariation {
    Builtin = 100,
    Record = 101,
    Typedef = 102,
    Variadic = 103,
    Pointer = 104,
    Array = 105,
    Variant = 106,
    Nil = 107,
}

impl TypeVariation {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            100 => Some(TypeVariation::Builtin),
            101 => Some(TypeVariation::Record),
            102 => Some(TypeVariation::Typedef),
            103 => Some(TypeVariation::Variadic),
            104 => Some(TypeVariation::Pointer),
            105 => Some(TypeVariation::Array),
            106 => Some(TypeVariation::Variant),
            107 => Some(TypeVariation::Nil),
            _ => None,
        }
    }
}

/// Storage classes in C
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    #[default]
    None,
    Auto,
    Static,
    Extern,
    Register,
}

impl StorageClass {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(StorageClass::None),
            1 => Some(StorageClass::Auto),
            2 => Some(StorageClass::Static),
            3 => Some(StorageClass::Extern),
            4 => Some(StorageClass::Register),
            _ => None,
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageClass::None => Ok(()),
            StorageClass::Auto => write!(f, "auto"),
            StorageClass::Static => write!(f, "static"),
            StorageClass::Extern => write!(f, "extern"),
            StorageClass::Register => write!(f, "register"),
        }
    }
}

/// Type qualifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeQualifier {
    #[default]
    None,
    Const,
    Volatile,
}

impl TypeQualifier {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TypeQualifier::None),
            1 => Some(TypeQualifier::Const),
            2 => Some(TypeQualifier::Volatile),
            _ => None,
        }
    }
}

impl fmt::Display for TypeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeQualifier::None => Ok(()),
            TypeQualifier::Const => write!(f, "const"),
            TypeQualifier::Volatile => write!(f, "volatile"),
        }
    }
}

/// Attributes shared by every variant, written as the envelope trailer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTraits {
    pub inline: bool,
    pub sensitive: bool,
    pub storage: StorageClass,
    pub qualifiers: [TypeQualifier; 2],
}

/// Variant-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeKind {
    Builtin(BuiltinType),
    Record(RecordType),
    Pointer(Rc<Type>),
    Array { count: u64, element: Rc<Type> },
    Typedef { name: String, resolved: Rc<Type> },
    Variadic,
    Variant(Vec<Rc<Type>>),
    Nil,
}

/// A C type: one fixed variant plus its trailer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    kind: TypeKind,
    traits: TypeTraits,
}

impl Type {
    /// Pointer width under the LP64 data model
    pub const POINTER_SIZE: u64 = 8;

    fn from_kind(kind: TypeKind) -> Self {
        Self {
            kind,
            traits: TypeTraits::default(),
        }
    }

    pub(crate) fn from_parts(kind: TypeKind, traits: TypeTraits) -> Self {
        Self { kind, traits }
    }

    pub fn builtin(specifier: Specifier) -> Self {
        Self::from_kind(TypeKind::Builtin(BuiltinType::new(specifier)))
    }

    pub fn from_builtin(builtin: BuiltinType) -> Self {
        Self::from_kind(TypeKind::Builtin(builtin))
    }

    pub fn record(record: RecordType) -> Self {
        Self::from_kind(TypeKind::Record(record))
    }

    pub fn pointer(pointee: Rc<Type>) -> Self {
        Self::from_kind(TypeKind::Pointer(pointee))
    }

    pub fn array(count: u64, element: Rc<Type>) -> Self {
        Self::from_kind(TypeKind::Array { count, element })
    }

    pub fn typedef(name: impl Into<String>, resolved: Rc<Type>) -> Self {
        Self::from_kind(TypeKind::Typedef {
            name: name.into(),
            resolved,
        })
    }

    pub fn variadic() -> Self {
        Self::from_kind(TypeKind::Variadic)
    }

    pub fn variant(members: Vec<Rc<Type>>) -> Self {
        Self::from_kind(TypeKind::Variant(members))
    }

    pub fn nil() -> Self {
        Self::from_kind(TypeKind::Nil)
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn traits(&self) -> &TypeTraits {
        &self.traits
    }

    pub fn variation(&self) -> TypeVariation {
        match &self.kind {
            TypeKind::Builtin(_) => TypeVariation::Builtin,
            TypeKind::Record(_) => TypeVariation::Record,
            TypeKind::Pointer(_) => TypeVariation::Pointer,
            TypeKind::Array { .. } => TypeVariation::Array,
            TypeKind::Typedef { .. } => TypeVariation::Typedef,
            TypeKind::Variadic => TypeVariation::Variadic,
            TypeKind::Variant(_) => TypeVariation::Variant,
            TypeKind::Nil => TypeVariation::Nil,
        }
    }

    // Trailer mutation

    pub fn with_storage(mut self, storage: StorageClass) -> Self {
        self.traits.storage = storage;
        self
    }

    pub fn with_qualifier(mut self, qualifier: TypeQualifier) -> Self {
        self.add_qualifier(qualifier);
        self
    }

    pub fn set_storage(&mut self, storage: StorageClass) {
        self.traits.storage = storage;
    }

    pub fn set_inline(&mut self, inline: bool) {
        self.traits.inline = inline;
    }

    pub fn set_sensitive(&mut self, sensitive: bool) {
        self.traits.sensitive = sensitive;
    }

    /// Put a qualifier in the first free slot. Returns false when it is
    /// already present or both slots are taken.
    pub fn add_qualifier(&mut self, qualifier: TypeQualifier) -> bool {
        if qualifier == TypeQualifier::None || self.has_qualifier(qualifier) {
            return false;
        }
        match self
            .traits
            .qualifiers
            .iter_mut()
            .find(|slot| **slot == TypeQualifier::None)
        {
            Some(slot) => {
                *slot = qualifier;
                true
            }
            None => false,
        }
    }

    pub fn has_qualifier(&self, qualifier: TypeQualifier) -> bool {
        self.traits.qualifiers.contains(&qualifier)
    }

    pub fn clear_qualifiers(&mut self) {
        self.traits.qualifiers = [TypeQualifier::None; 2];
    }

    pub fn is_inline(&self) -> bool {
        self.traits.inline
    }

    pub fn is_sensitive(&self) -> bool {
        self.traits.sensitive
    }

    pub fn storage(&self) -> StorageClass {
        self.traits.storage
    }

    // Builtin consolidation

    /// True for builtins that already carry a modifier bit
    pub fn allow_coalescence(&self) -> bool {
        match &self.kind {
            TypeKind::Builtin(builtin) => builtin.allow_coalescence(),
            _ => false,
        }
    }

    /// Fold another builtin into this one. Both must be builtins and this
    /// one must allow coalescence.
    pub fn consolidate(&mut self, other: &Type) {
        if let (TypeKind::Builtin(_), TypeKind::Builtin(that)) = (&self.kind, &other.kind) {
            let that = *that;
            if let TypeKind::Builtin(this) = &mut self.kind {
                this.consolidate(&that);
            }
            return;
        }
        fatal!(
            "consolidation is only defined between builtin types, got '{}' and '{}'",
            self,
            other
        )
    }

    // Queries

    pub fn as_builtin(&self) -> Option<&BuiltinType> {
        match &self.kind {
            TypeKind::Builtin(builtin) => Some(builtin),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match &self.resolved().kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Follow typedef chains to the underlying type
    pub fn resolved(&self) -> &Type {
        let mut current = self;
        while let TypeKind::Typedef { resolved, .. } = &current.kind {
            current = resolved;
        }
        current
    }

    pub fn is_integer(&self) -> bool {
        self.resolved()
            .as_builtin()
            .is_some_and(|b| b.effective_specifier().is_integer())
    }

    pub fn is_floating(&self) -> bool {
        self.resolved()
            .as_builtin()
            .is_some_and(|b| b.effective_specifier().is_floating())
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    pub fn size_in_bytes(&self) -> Option<u64> {
        match &self.kind {
            TypeKind::Builtin(builtin) => builtin.size_in_bytes(),
            TypeKind::Record(record) => record.size_in_bytes(),
            TypeKind::Pointer(_) => Some(Self::POINTER_SIZE),
            TypeKind::Array { count, element } => element.size_in_bytes().and_then(|size| size.checked_mul(*count)),
            TypeKind::Typedef { resolved, .. } => resolved.size_in_bytes(),
            TypeKind::Variadic | TypeKind::Variant(_) | TypeKind::Nil => None,
        }
    }

    /// Structural equality plus the trailer, recursively
    pub fn identical(&self, other: &Type) -> bool {
        if self.traits != other.traits {
            return false;
        }
        match (&self.kind, &other.kind) {
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => a.identical(b),
            (
                TypeKind::Array { count: ca, element: a },
                TypeKind::Array { count: cb, element: b },
            ) => ca == cb && a.identical(b),
            (
                TypeKind::Typedef { name: na, resolved: a },
                TypeKind::Typedef { name: nb, resolved: b },
            ) => na == nb && a.identical(b),
            (TypeKind::Variant(a), TypeKind::Variant(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (TypeKind::Record(a), TypeKind::Record(b)) => {
                a.name() == b.name()
                    && a.specifier() == b.specifier()
                    && a.field_count() == b.field_count()
                    && a.fields()
                        .iter()
                        .zip(b.fields())
                        .all(|(x, y)| x.name == y.name && x.facade.identical(&y.facade))
            }
            _ => self == other,
        }
    }
}

/// Variant-checked structural equality. Sub-types are compared by value,
/// never by identity; the trailer is not compared.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Builtin(a), TypeKind::Builtin(b)) => a == b,
            (TypeKind::Record(a), TypeKind::Record(b)) => a == b,
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => **a == **b,
            (
                TypeKind::Array { count: ca, element: a },
                TypeKind::Array { count: cb, element: b },
            ) => ca == cb && **a == **b,
            (
                TypeKind::Typedef { name: na, resolved: a },
                TypeKind::Typedef { name: nb, resolved: b },
            ) => na == nb && **a == **b,
            (TypeKind::Variant(a), TypeKind::Variant(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| **x == **y)
            }
            (TypeKind::Variadic, TypeKind::Variadic) | (TypeKind::Nil, TypeKind::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.traits.inline {
            write!(f, "inline ")?;
        }
        if self.traits.storage != StorageClass::None {
            write!(f, "{} ", self.traits.storage)?;
        }
        for qualifier in self.traits.qualifiers {
            if qualifier != TypeQualifier::None {
                write!(f, "{qualifier} ")?;
            }
        }
        match &self.kind {
            TypeKind::Builtin(builtin) => write!(f, "{builtin}"),
            TypeKind::Record(record) => write!(f, "{record}"),
            TypeKind::Pointer(pointee) => write!(f, "{pointee}*"),
            TypeKind::Array { count, element } => write!(f, "{element}[{count}]"),
            TypeKind::Typedef { name, .. } => write!(f, "{name}"),
            TypeKind::Variadic => write!(f, "..."),
            TypeKind::Variant(members) => {
                write!(f, "variant<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, ">")
            }
            TypeKind::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> Rc<Type> {
        Rc::new(Type::builtin(Specifier::Int))
    }

    #[test]
    fn test_variation_tags() {
        for tag in 100..=107 {
            let variation = TypeVariation::from_tag(tag).unwrap();
            assert_eq!(variation.tag(), tag);
        }
        assert_eq!(TypeVariation::from_tag(0), None);
        assert_eq!(Type::variadic().variation(), TypeVariation::Variadic);
    }

    #[test]
    fn test_structural_equality_recurses() {
        let a = Type::pointer(int());
        let b = Type::pointer(Rc::new(Type::builtin(Specifier::Int)));
        assert_eq!(a, b);
        assert_ne!(a, Type::pointer(Rc::new(Type::builtin(Specifier::Char))));

        assert_eq!(Type::array(4, int()), Type::array(4, int()));
        assert_ne!(Type::array(4, int()), Type::array(5, int()));
        assert_ne!(Type::array(4, int()), Type::pointer(int()));

        assert_eq!(Type::typedef("myint", int()), Type::typedef("myint", int()));
        assert_ne!(Type::typedef("myint", int()), Type::typedef("other", int()));
        assert_eq!(Type::nil(), Type::nil());
    }

    #[test]
    fn test_trailer_not_part_of_equality() {
        let plain = Type::builtin(Specifier::Int);
        let constant = Type::builtin(Specifier::Int).with_qualifier(TypeQualifier::Const);
        assert_eq!(plain, constant);
        assert!(!plain.identical(&constant));
        assert!(constant.identical(&constant.clone()));
    }

    #[test]
    fn test_qualifier_slots() {
        let mut ty = Type::builtin(Specifier::Int);
        assert!(ty.add_qualifier(TypeQualifier::Const));
        assert!(!ty.add_qualifier(TypeQualifier::Const));
        assert!(ty.add_qualifier(TypeQualifier::Volatile));
        assert!(ty.has_qualifier(TypeQualifier::Volatile));
        assert!(!ty.add_qualifier(TypeQualifier::None));
        ty.clear_qualifiers();
        assert!(!ty.has_qualifier(TypeQualifier::Const));
    }

    #[test]
    fn test_consolidate_through_type() {
        let mut ty = Type::from_builtin(BuiltinType::from_keyword("unsigned").unwrap());
        assert!(ty.allow_coalescence());
        ty.consolidate(&Type::from_builtin(BuiltinType::from_keyword("short").unwrap()));
        assert_eq!(ty, Type::builtin(Specifier::UnsignedShort));
        assert!(!Type::nil().allow_coalescence());
    }

    #[test]
    #[should_panic(expected = "only defined between builtin types")]
    fn test_consolidate_record_is_fatal() {
        let mut ty = Type::record(RecordType::new("s", RecordSpecifier::Struct));
        ty.consolidate(&Type::builtin(Specifier::Int));
    }

    #[test]
    fn test_display() {
        let ty = Type::builtin(Specifier::UnsignedLong)
            .with_storage(StorageClass::Static)
            .with_qualifier(TypeQualifier::Const);
        assert_eq!(ty.to_string(), "static const unsigned long");
        assert_eq!(Type::pointer(int()).to_string(), "int*");
        assert_eq!(Type::array(3, int()).to_string(), "int[3]");
        assert_eq!(
            Type::variant(vec![int(), Rc::new(Type::builtin(Specifier::Char))]).to_string(),
            "variant<int, char>"
        );
        assert_eq!(Type::variadic().to_string(), "...");
    }

    #[test]
    fn test_sizes_and_queries() {
        let typedef = Type::typedef("size_t", Rc::new(Type::builtin(Specifier::UnsignedLong)));
        assert_eq!(typedef.size_in_bytes(), Some(8));
        assert!(typedef.is_integer());
        assert!(!typedef.is_floating());
        assert_eq!(Type::array(3, int()).size_in_bytes(), Some(12));
        assert_eq!(Type::pointer(int()).size_in_bytes(), Some(8));
        assert_eq!(Type::nil().size_in_bytes(), None);
        assert!(Type::builtin(Specifier::Double).is_arithmetic());
    }

    #[test]
    fn test_oversized_array_has_no_size() {
        let huge = Rc::new(Type::array(u64::MAX / 2, int()));
        assert_eq!(huge.size_in_bytes(), None);
        assert_eq!(Type::array(3, Rc::new(Type::array(u64::MAX / 8, int()))).size_in_bytes(), None);

        let half = Rc::new(Type::array(u64::MAX / 8 + 1, int()));
        let record = RecordType::new("big", RecordSpecifier::Struct)
            .with_field("a", TypeFacade::new(Rc::clone(&half)))
            .and_then(|r| r.with_field("b", TypeFacade::new(half)))
            .unwrap();
        assert_eq!(Type::record(record).size_in_bytes(), None);
    }
}
