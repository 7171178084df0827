use std::rc::Rc;

use crate::{
    ast::{
        expressions::{BinaryOp, Expr, UnaryOp},
        types::TypeNode,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::types::{ScalarKind, Type};

/// A scalar value known at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i32),
    Float(f32),
}

impl ConstValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ConstValue::Int(_) => ScalarKind::Int,
            ConstValue::Float(_) => ScalarKind::Float,
        }
    }

    pub fn as_int(&self) -> i32 {
        match *self {
            ConstValue::Int(value) => value,
            ConstValue::Float(value) => value as i32,
        }
    }

    pub fn as_float(&self) -> f32 {
        match *self {
            ConstValue::Int(value) => value as f32,
            ConstValue::Float(value) => value,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            ConstValue::Int(value) => value != 0,
            ConstValue::Float(value) => value != 0.0,
        }
    }

    /// Converts with C semantics: float to int truncates toward zero.
    pub fn cast(self, kind: ScalarKind) -> ConstValue {
        match (self, kind) {
            (ConstValue::Float(value), ScalarKind::Int) => ConstValue::Int(value as i32),
            (ConstValue::Int(value), ScalarKind::Float) => ConstValue::Float(value as f32),
            (value, _) => value,
        }
    }

    pub fn into_expr(self, line: u32) -> Expr {
        match self {
            ConstValue::Int(value) => Expr::IntConst { value, line },
            ConstValue::Float(value) => Expr::FloatConst { value, line },
        }
    }

    pub fn from_expr(expr: &Expr) -> Option<ConstValue> {
        match expr {
            Expr::IntConst { value, .. } => Some(ConstValue::Int(*value)),
            Expr::FloatConst { value, .. } => Some(ConstValue::Float(*value)),
            _ => None,
        }
    }
}

/// Why a constant operation produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstError {
    DivisionByZero,
    Overflow,
}

fn bool_value(value: bool) -> ConstValue {
    ConstValue::Int(value as i32)
}

/// Evaluates a binary operator on two constants.
///
/// Mixed int/float operands promote to float. Comparisons and logical
/// operators give `Int` 0 or 1.
pub fn fold_binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Result<ConstValue, ConstError> {
    match (lhs, rhs) {
        (ConstValue::Int(l), ConstValue::Int(r)) => match op {
            BinaryOp::Add => Ok(ConstValue::Int(l.wrapping_add(r))),
            BinaryOp::Sub => Ok(ConstValue::Int(l.wrapping_sub(r))),
            BinaryOp::Mul => Ok(ConstValue::Int(l.wrapping_mul(r))),
            BinaryOp::Div | BinaryOp::Mod if r == 0 => Err(ConstError::DivisionByZero),
            BinaryOp::Div => l.checked_div(r).map(ConstValue::Int).ok_or(ConstError::Overflow),
            BinaryOp::Mod => l.checked_rem(r).map(ConstValue::Int).ok_or(ConstError::Overflow),
            BinaryOp::Lt => Ok(bool_value(l < r)),
            BinaryOp::Gt => Ok(bool_value(l > r)),
            BinaryOp::Le => Ok(bool_value(l <= r)),
            BinaryOp::Ge => Ok(bool_value(l >= r)),
            BinaryOp::Eq => Ok(bool_value(l == r)),
            BinaryOp::Ne => Ok(bool_value(l != r)),
            BinaryOp::And => Ok(bool_value(l != 0 && r != 0)),
            BinaryOp::Or => Ok(bool_value(l != 0 || r != 0)),
        },
        _ => {
            let (l, r) = (lhs.as_float(), rhs.as_float());
            match op {
                BinaryOp::Add => Ok(ConstValue::Float(l + r)),
                BinaryOp::Sub => Ok(ConstValue::Float(l - r)),
                BinaryOp::Mul => Ok(ConstValue::Float(l * r)),
                BinaryOp::Div if r == 0.0 => Err(ConstError::DivisionByZero),
                BinaryOp::Div => Ok(ConstValue::Float(l / r)),
                BinaryOp::Mod => Ok(ConstValue::Float(0.0)),
                BinaryOp::Lt => Ok(bool_value(l < r)),
                BinaryOp::Gt => Ok(bool_value(l > r)),
                BinaryOp::Le => Ok(bool_value(l <= r)),
                BinaryOp::Ge => Ok(bool_value(l >= r)),
                BinaryOp::Eq => Ok(bool_value(l == r)),
                BinaryOp::Ne => Ok(bool_value(l != r)),
                BinaryOp::And => Ok(bool_value(l != 0.0 && r != 0.0)),
                BinaryOp::Or => Ok(bool_value(l != 0.0 || r != 0.0)),
            }
        }
    }
}

pub fn fold_unary(op: UnaryOp, operand: ConstValue) -> ConstValue {
    match (op, operand) {
        (UnaryOp::Plus, value) => value,
        (UnaryOp::Minus, ConstValue::Int(value)) => ConstValue::Int(value.wrapping_neg()),
        (UnaryOp::Minus, ConstValue::Float(value)) => ConstValue::Float(-value),
        (UnaryOp::Not, value) => bool_value(!value.is_truthy()),
    }
}

/// What a name means to the constant evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstBinding {
    /// A global scalar constant with a known value.
    Value(ConstValue),
    /// Bound, but not usable in a constant expression.
    NotConstant,
    Undefined,
}

pub trait ConstantLookup {
    fn lookup_constant(&self, name: &str) -> ConstBinding;
}

/// Which bound a size must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBound {
    /// Array dimensions of declared variables.
    NonNegative,
    /// Vector lengths and array parameter dimensions.
    Positive,
}

pub struct ConstEvaluator<'l, L: ConstantLookup> {
    lookup: &'l L,
    file_name: Rc<String>,
}

impl<'l, L: ConstantLookup> ConstEvaluator<'l, L> {
    pub fn new(lookup: &'l L, file_name: Rc<String>) -> Self {
        ConstEvaluator { lookup, file_name }
    }

    fn error(&self, error: ErrorImpl, line: u32) -> Error {
        Error::new(error, Position(line, Rc::clone(&self.file_name)))
    }

    /// Evaluates an array dimension or vector length.
    pub fn eval_size(&self, expr: &Expr, bound: SizeBound) -> Result<usize, Error> {
        let size = self.eval_size_expr(expr)?;

        match bound {
            SizeBound::NonNegative if size < 0 => Err(self.error(
                ErrorImpl::InvalidArraySize {
                    message: format!("size {} is negative", size),
                },
                expr.line(),
            )),
            SizeBound::Positive if size <= 0 => Err(self.error(
                ErrorImpl::InvalidArraySize {
                    message: format!("size {} must be positive", size),
                },
                expr.line(),
            )),
            _ => Ok(size as usize),
        }
    }

    fn eval_size_expr(&self, expr: &Expr) -> Result<i32, Error> {
        match expr {
            Expr::IntConst { value, line } => {
                if *value < 0 {
                    return Err(self.error(
                        ErrorImpl::InvalidArraySize {
                            message: format!("literal {} is negative", value),
                        },
                        *line,
                    ));
                }
                Ok(*value)
            }
            Expr::LVal(lval) if lval.indices.is_empty() => {
                match self.lookup.lookup_constant(&lval.name) {
                    ConstBinding::Value(ConstValue::Int(value)) => Ok(value),
                    ConstBinding::Value(ConstValue::Float(_)) => Err(self.error(
                        ErrorImpl::InvalidArraySize {
                            message: format!("constant `{}` is not an integer", lval.name),
                        },
                        lval.line,
                    )),
                    ConstBinding::NotConstant => Err(self.error(
                        ErrorImpl::NonConstantExpression {
                            message: format!(
                                "`{}` is not a global constant and cannot be used as a size",
                                lval.name
                            ),
                        },
                        lval.line,
                    )),
                    ConstBinding::Undefined => Err(self.error(
                        ErrorImpl::VariableNotDeclared {
                            variable: lval.name.clone(),
                        },
                        lval.line,
                    )),
                }
            }
            Expr::Binary { op, lhs, rhs, line } if op.is_arithmetic() => {
                let l = self.eval_size_expr(lhs)?;
                let r = self.eval_size_expr(rhs)?;

                let result = match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    _ if r == 0 => return Err(self.error(ErrorImpl::DivisionByZero, *line)),
                    BinaryOp::Div => l.checked_div(r),
                    _ => l.checked_rem(r),
                };

                result.ok_or_else(|| {
                    self.error(
                        ErrorImpl::InvalidArraySize {
                            message: String::from("integer overflow"),
                        },
                        *line,
                    )
                })
            }
            Expr::Unary {
                op: UnaryOp::Plus,
                operand,
                ..
            } => self.eval_size_expr(operand),
            Expr::Unary {
                op: UnaryOp::Minus,
                operand,
                line,
            } => self.eval_size_expr(operand)?.checked_neg().ok_or_else(|| {
                self.error(
                    ErrorImpl::InvalidArraySize {
                        message: String::from("integer overflow"),
                    },
                    *line,
                )
            }),
            other => Err(self.error(
                ErrorImpl::NonConstantExpression {
                    message: String::from("Array size must be a constant"),
                },
                other.line(),
            )),
        }
    }

    /// Evaluates a scalar expression that must be fully known at compile time,
    /// such as a global initializer element.
    pub fn eval_scalar(&self, expr: &Expr) -> Result<ConstValue, Error> {
        match expr {
            Expr::IntConst { value, .. } => Ok(ConstValue::Int(*value)),
            Expr::FloatConst { value, .. } => Ok(ConstValue::Float(*value)),
            Expr::LVal(lval) if lval.indices.is_empty() => {
                match self.lookup.lookup_constant(&lval.name) {
                    ConstBinding::Value(value) => Ok(value),
                    ConstBinding::NotConstant => Err(self.error(
                        ErrorImpl::NonConstantExpression {
                            message: format!("`{}` is not a constant", lval.name),
                        },
                        lval.line,
                    )),
                    ConstBinding::Undefined => Err(self.error(
                        ErrorImpl::VariableNotDeclared {
                            variable: lval.name.clone(),
                        },
                        lval.line,
                    )),
                }
            }
            Expr::Binary { op, lhs, rhs, line } => {
                let l = self.eval_scalar(lhs)?;
                let r = self.eval_scalar(rhs)?;

                fold_binary(*op, l, r).map_err(|error| match error {
                    ConstError::DivisionByZero => self.error(ErrorImpl::DivisionByZero, *line),
                    ConstError::Overflow => self.error(
                        ErrorImpl::NonConstantExpression {
                            message: String::from("integer overflow in constant expression"),
                        },
                        *line,
                    ),
                })
            }
            Expr::Unary { op, operand, .. } => Ok(fold_unary(*op, self.eval_scalar(operand)?)),
            other => Err(self.error(
                ErrorImpl::NonConstantExpression {
                    message: String::from("initializer must be a compile-time constant"),
                },
                other.line(),
            )),
        }
    }

    /// Resolves a declared base type, evaluating the vector length if any.
    pub fn resolve_type(&self, node: &TypeNode) -> Result<Type, Error> {
        match node {
            TypeNode::Int => Ok(Type::Int),
            TypeNode::Float => Ok(Type::Float),
            TypeNode::Void => Ok(Type::Void),
            TypeNode::Vector { element, size } => {
                let length = self.eval_size(size, SizeBound::Positive)?;
                Ok(Type::Vector(*element, length))
            }
        }
    }
}
