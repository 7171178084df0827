use std::fmt::Display;

use super::expressions::Expr;

/// Element kind shared by scalars and vector lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Float => write!(f, "float"),
        }
    }
}

/// A type as written in the source, before its size expressions are evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Int,
    Float,
    Void,
    Vector { element: ScalarKind, size: Box<Expr> },
}

impl TypeNode {
    pub fn vector(element: ScalarKind, size: Expr) -> Self {
        TypeNode::Vector {
            element,
            size: Box::new(size),
        }
    }
}
