use crate::{
    ast::{
        ast::{CompUnit, Decl, Function, Initializer, Param},
        expressions::{Expr, LVal},
        statements::{Block, BlockItem, Stmt},
        types::TypeNode,
    },
    types::const_eval::{fold_binary, fold_unary, ConstValue},
};

/// Replaces constant-valued subtrees with literals, bottom-up.
///
/// Every `fold_*` method reports whether it rewrote anything, so a pass over
/// an already folded tree reports no change.
#[derive(Debug, Default)]
pub struct ConstantFolder {
    rewrites: usize,
}

impl ConstantFolder {
    pub fn new() -> Self {
        ConstantFolder::default()
    }

    /// Total number of nodes replaced by this folder so far.
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }

    /// One pass over the unit: global declarations first, then functions.
    pub fn fold(&mut self, unit: &mut CompUnit) -> bool {
        let mut changed = false;
        for decl in unit.decls.iter_mut() {
            changed |= self.fold_decl(decl);
        }
        for function in unit.functions.iter_mut() {
            changed |= self.fold_function(function);
        }
        changed
    }

    fn fold_function(&mut self, function: &mut Function) -> bool {
        let mut changed = self.fold_type_node(&mut function.return_type);
        for param in function.params.iter_mut() {
            changed |= self.fold_param(param);
        }
        changed | self.fold_block(&mut function.body)
    }

    fn fold_param(&mut self, param: &mut Param) -> bool {
        let mut changed = self.fold_type_node(&mut param.ty);
        for dim in param.dims.iter_mut() {
            changed |= self.fold_expr(dim);
        }
        changed
    }

    fn fold_type_node(&mut self, node: &mut TypeNode) -> bool {
        match node {
            TypeNode::Vector { size, .. } => self.fold_expr(size),
            _ => false,
        }
    }

    pub fn fold_decl(&mut self, decl: &mut Decl) -> bool {
        let (ty, defs) = decl.parts_mut();
        let mut changed = self.fold_type_node(ty);

        for def in defs.iter_mut() {
            for dim in def.dims.iter_mut() {
                changed |= self.fold_expr(dim);
            }
            if let Some(init) = def.init.as_mut() {
                changed |= self.fold_initializer(init);
            }
        }
        changed
    }

    fn fold_initializer(&mut self, init: &mut Initializer) -> bool {
        match init {
            Initializer::Expr(expr) => self.fold_expr(expr),
            Initializer::List(items) => items
                .iter_mut()
                .fold(false, |changed, item| self.fold_initializer(item) | changed),
        }
    }

    pub fn fold_block(&mut self, block: &mut Block) -> bool {
        let mut changed = false;
        for item in block.items.iter_mut() {
            changed |= match item {
                BlockItem::Decl(decl) => self.fold_decl(decl),
                BlockItem::Stmt(stmt) => self.fold_stmt(stmt),
            };
        }
        changed
    }

    pub fn fold_stmt(&mut self, stmt: &mut Stmt) -> bool {
        match stmt {
            Stmt::Assign { target, value, .. } => self.fold_lval(target) | self.fold_expr(value),
            Stmt::Expr { expr, .. } => expr.as_mut().is_some_and(|expr| self.fold_expr(expr)),
            Stmt::Block(block) => self.fold_block(block),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let mut changed = self.fold_expr(cond);
                changed |= self.fold_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    changed |= self.fold_stmt(else_branch);
                }
                changed
            }
            Stmt::While { cond, body, .. } => self.fold_expr(cond) | self.fold_stmt(body),
            Stmt::Return { value, .. } => value.as_mut().is_some_and(|value| self.fold_expr(value)),
            Stmt::Break { .. } | Stmt::Continue { .. } => false,
        }
    }

    fn fold_lval(&mut self, lval: &mut LVal) -> bool {
        lval.indices
            .iter_mut()
            .fold(false, |changed, index| self.fold_expr(index) | changed)
    }

    pub fn fold_expr(&mut self, expr: &mut Expr) -> bool {
        let (changed, replacement) = match expr {
            Expr::Binary { op, lhs, rhs, line } => {
                let changed = self.fold_expr(lhs) | self.fold_expr(rhs);
                let folded = match (ConstValue::from_expr(lhs), ConstValue::from_expr(rhs)) {
                    // Division by zero and overflow stay in the tree for lowering to report.
                    (Some(l), Some(r)) => fold_binary(*op, l, r).ok(),
                    _ => None,
                };
                (changed, folded.map(|value| value.into_expr(*line)))
            }
            Expr::Unary { op, operand, line } => {
                let changed = self.fold_expr(operand);
                let folded = ConstValue::from_expr(operand).map(|value| fold_unary(*op, value));
                (changed, folded.map(|value| value.into_expr(*line)))
            }
            Expr::Call { args, .. } => (
                args.iter_mut()
                    .fold(false, |changed, arg| self.fold_expr(arg) | changed),
                None,
            ),
            Expr::LVal(lval) => (self.fold_lval(lval), None),
            Expr::IntConst { .. } | Expr::FloatConst { .. } | Expr::StringLit { .. } => {
                (false, None)
            }
        };

        match replacement {
            Some(folded) => {
                *expr = folded;
                self.rewrites += 1;
                true
            }
            None => changed,
        }
    }
}
