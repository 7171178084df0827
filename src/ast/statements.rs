use super::{
    ast::Decl,
    expressions::{Expr, LVal},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub items: Vec<BlockItem>,
}

impl Block {
    pub fn new(items: Vec<BlockItem>) -> Self {
        Block { items }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Decl(Decl),
    Stmt(Stmt),
}

impl From<Decl> for BlockItem {
    fn from(decl: Decl) -> Self {
        BlockItem::Decl(decl)
    }
}

impl From<Stmt> for BlockItem {
    fn from(stmt: Stmt) -> Self {
        BlockItem::Stmt(stmt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: LVal,
        value: Expr,
        line: u32,
    },
    Expr {
        expr: Option<Expr>,
        line: u32,
    },
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        line: u32,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        line: u32,
    },
    Break {
        line: u32,
    },
    Continue {
        line: u32,
    },
    Return {
        value: Option<Expr>,
        line: u32,
    },
}

impl Stmt {
    pub fn assign(target: LVal, value: Expr) -> Self {
        Stmt::Assign {
            target,
            value,
            line: 0,
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr {
            expr: Some(expr),
            line: 0,
        }
    }

    pub fn block(items: Vec<BlockItem>) -> Self {
        Stmt::Block(Block::new(items))
    }

    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            line: 0,
        }
    }

    pub fn while_loop(cond: Expr, body: Stmt) -> Self {
        Stmt::While {
            cond,
            body: Box::new(body),
            line: 0,
        }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return { value, line: 0 }
    }

    pub fn at(mut self, new_line: u32) -> Self {
        match &mut self {
            Stmt::Assign { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Break { line }
            | Stmt::Continue { line }
            | Stmt::Return { line, .. } => *line = new_line,
            Stmt::Block(_) => {}
        }
        self
    }

    /// Line of the statement; blocks report their first statement's line.
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Assign { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Break { line }
            | Stmt::Continue { line }
            | Stmt::Return { line, .. } => *line,
            Stmt::Block(block) => match block.items.first() {
                Some(BlockItem::Stmt(stmt)) => stmt.line(),
                Some(BlockItem::Decl(decl)) => decl.line(),
                None => 0,
            },
        }
    }
}
