use super::{expressions::Expr, statements::Block, types::TypeNode};

/// The root of a program: global declarations and functions, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompUnit {
    pub decls: Vec<Decl>,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Const { ty: TypeNode, defs: Vec<Def> },
    Var { ty: TypeNode, defs: Vec<Def> },
}

impl Decl {
    pub fn is_const(&self) -> bool {
        matches!(self, Decl::Const { .. })
    }

    pub fn ty(&self) -> &TypeNode {
        match self {
            Decl::Const { ty, .. } | Decl::Var { ty, .. } => ty,
        }
    }

    pub fn defs(&self) -> &[Def] {
        match self {
            Decl::Const { defs, .. } | Decl::Var { defs, .. } => defs,
        }
    }

    pub fn parts_mut(&mut self) -> (&mut TypeNode, &mut Vec<Def>) {
        match self {
            Decl::Const { ty, defs } | Decl::Var { ty, defs } => (ty, defs),
        }
    }

    pub fn line(&self) -> u32 {
        self.defs().first().map(|def| def.line).unwrap_or(0)
    }
}

/// One declared name with its dimensions and optional initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct Def {
    pub name: String,
    pub dims: Vec<Expr>,
    pub init: Option<Initializer>,
    pub line: u32,
}

impl Def {
    pub fn new(name: &str, dims: Vec<Expr>, init: Option<Initializer>) -> Self {
        Def {
            name: name.to_string(),
            dims,
            init,
            line: 0,
        }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Expr(Expr),
    List(Vec<Initializer>),
}

impl Initializer {
    /// Builds a flat brace list of expressions.
    pub fn list(items: Vec<Expr>) -> Self {
        Initializer::List(items.into_iter().map(Initializer::Expr).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: TypeNode,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub line: u32,
}

impl Function {
    pub fn new(return_type: TypeNode, name: &str, params: Vec<Param>, body: Block) -> Self {
        Function {
            return_type,
            name: name.to_string(),
            params,
            body,
            line: 0,
        }
    }
}

/// A function parameter. Array parameters omit their first dimension;
/// `dims` holds only the trailing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeNode,
    pub name: String,
    pub is_array: bool,
    pub dims: Vec<Expr>,
    pub line: u32,
}

impl Param {
    pub fn scalar(ty: TypeNode, name: &str) -> Self {
        Param {
            ty,
            name: name.to_string(),
            is_array: false,
            dims: vec![],
            line: 0,
        }
    }

    pub fn array(ty: TypeNode, name: &str, dims: Vec<Expr>) -> Self {
        Param {
            ty,
            name: name.to_string(),
            is_array: true,
            dims,
            line: 0,
        }
    }
}
