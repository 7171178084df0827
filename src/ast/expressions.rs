use std::fmt::Display;

/// Binary operators, arithmetic first, then comparisons, then logical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Minus => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// A named storage location, optionally indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct LVal {
    pub name: String,
    pub indices: Vec<Expr>,
    pub line: u32,
}

impl LVal {
    pub fn new(name: &str, indices: Vec<Expr>) -> Self {
        LVal {
            name: name.to_string(),
            indices,
            line: 0,
        }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntConst {
        value: i32,
        line: u32,
    },
    FloatConst {
        value: f32,
        line: u32,
    },
    StringLit {
        value: String,
        line: u32,
    },
    LVal(LVal),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: u32,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: u32,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        line: u32,
    },
}

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::IntConst { value, line: 0 }
    }

    pub fn float(value: f32) -> Self {
        Expr::FloatConst { value, line: 0 }
    }

    pub fn string(value: &str) -> Self {
        Expr::StringLit {
            value: value.to_string(),
            line: 0,
        }
    }

    pub fn var(name: &str) -> Self {
        Expr::LVal(LVal::new(name, vec![]))
    }

    pub fn index(name: &str, indices: Vec<Expr>) -> Self {
        Expr::LVal(LVal::new(name, indices))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            line: 0,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            line: 0,
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.to_string(),
            args,
            line: 0,
        }
    }

    /// Sets the source line of this node (not of its children).
    pub fn at(mut self, new_line: u32) -> Self {
        match &mut self {
            Expr::IntConst { line, .. }
            | Expr::FloatConst { line, .. }
            | Expr::StringLit { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Call { line, .. } => *line = new_line,
            Expr::LVal(lval) => lval.line = new_line,
        }
        self
    }

    pub fn line(&self) -> u32 {
        match self {
            Expr::IntConst { line, .. }
            | Expr::FloatConst { line, .. }
            | Expr::StringLit { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Call { line, .. } => *line,
            Expr::LVal(lval) => lval.line,
        }
    }

    /// True for integer and float literals.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::IntConst { .. } | Expr::FloatConst { .. })
    }
}
