//! Type system of the analyzed program
//!
//! Reference types are classes (including interfaces) and arrays; the
//! null type is a subtype of every reference type.

use serde::{Deserialize, Serialize};

crate::index_id! {
    /// Handle of a class or interface in the program arena
    pub struct ClassId;
}

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// A type of the analyzed program
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassId),
    Array(Box<Type>),
    Null,
    Void,
}

impl Type {
    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// Whether values of this type can hold heap references
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_) | Type::Null)
    }

    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Type::Class(c) => Some(*c),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names_round_trip() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(p.name()), Some(p));
        }
        assert_eq!(PrimitiveType::from_name("String"), None);
    }

    #[test]
    fn test_reference_types() {
        assert!(Type::Class(ClassId(0)).is_reference());
        assert!(Type::array_of(Type::Primitive(PrimitiveType::Int)).is_reference());
        assert!(Type::Null.is_reference());
        assert!(!Type::Primitive(PrimitiveType::Long).is_reference());
        assert!(!Type::Void.is_reference());
    }
}
