use std::fmt::Display;

pub use crate::ast::types::ScalarKind;

/// A resolved type.
///
/// `Pointer` and `Str` never come from a declaration: they describe lowered
/// values (decayed arrays, array parameters and string literals).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Void,
    Array(Box<Type>, usize),
    Vector(ScalarKind, usize),
    Pointer(Box<Type>),
    Str,
}

impl Type {
    pub fn scalar(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int => Type::Int,
            ScalarKind::Float => Type::Float,
        }
    }

    /// Wraps `base` in `dims`, outermost dimension first, so `[3, 2]` gives
    /// three arrays of two elements.
    pub fn with_dims(base: Type, dims: &[usize]) -> Self {
        dims.iter()
            .rev()
            .fold(base, |inner, &length| Type::Array(Box::new(inner), length))
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Type::Int => Some(ScalarKind::Int),
            Type::Float => Some(ScalarKind::Float),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar_kind().is_some()
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..))
    }

    /// Lengths of every array dimension, outermost first.
    pub fn array_dims(&self) -> Vec<usize> {
        let mut dims = vec![];
        let mut current = self;
        while let Type::Array(element, length) = current {
            dims.push(*length);
            current = element;
        }
        dims
    }

    /// The innermost non-array type.
    pub fn base_element(&self) -> &Type {
        match self {
            Type::Array(element, _) => element.base_element(),
            other => other,
        }
    }

    /// Strips `count` array dimensions.
    pub fn peel(&self, count: usize) -> Option<&Type> {
        let mut current = self;
        for _ in 0..count {
            match current {
                Type::Array(element, _) => current = element,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Number of scalar slots in an array or vector, `1` for scalars.
    pub fn flat_len(&self) -> usize {
        match self {
            Type::Array(element, length) => element.flat_len() * length,
            Type::Vector(_, length) => *length,
            _ => 1,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Void => write!(f, "void"),
            Type::Array(..) => {
                write!(f, "{}", self.base_element())?;
                for length in self.array_dims() {
                    write!(f, "[{}]", length)?;
                }
                Ok(())
            }
            Type::Vector(kind, length) => write!(f, "vector<{}, {}>", kind, length),
            Type::Pointer(pointee) => write!(f, "{}*", pointee),
            Type::Str => write!(f, "string"),
        }
    }
}
