use inkwell::{
    values::{BasicValueEnum, FloatMathValue, IntMathValue, IntValue, VectorValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::expressions::{BinaryOp, Expr, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    types::types::{ScalarKind, Type},
};

use super::{
    call::gen_call,
    compiler::Compiler,
    lvalue::gen_lval_value,
    value::{IrResult, TypedValue},
};

/// Which operators an expression may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    /// Right-hand sides, arguments, initializers and indices.
    Value,
    /// `if` and `while` guards, where `&&`, `||` and `!` are legal.
    Condition,
}

/// Generates LLVM IR for a value expression.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a>,
    expression: &Expr,
) -> Result<TypedValue<'a>, Error> {
    gen_expr_in(compiler, expression, ExprContext::Value)
}

/// Generates an `i1` truth value for a guard.
pub fn gen_condition<'a>(compiler: &Compiler<'a>, expression: &Expr) -> Result<IntValue<'a>, Error> {
    let value = gen_expr_in(compiler, expression, ExprContext::Condition)?;
    to_bool(compiler, &value, expression.line())
}

pub fn gen_expr_in<'a>(
    compiler: &Compiler<'a>,
    expression: &Expr,
    context: ExprContext,
) -> Result<TypedValue<'a>, Error> {
    let value = match expression {
        Expr::IntConst { value, .. } => TypedValue::new(
            compiler.context.i32_type().const_int(*value as u64, true),
            Type::Int,
        ),
        Expr::FloatConst { value, .. } => TypedValue::new(
            compiler.context.f32_type().const_float(*value as f64),
            Type::Float,
        ),
        Expr::StringLit { value, line } => {
            let global = compiler
                .builder
                .build_global_string_ptr(value, ".str")
                .at_line(&compiler.file_name, *line)?;
            TypedValue::new(global.as_pointer_value(), Type::Str)
        }
        Expr::LVal(lval) => gen_lval_value(compiler, lval)?,
        Expr::Call { name, args, line } => gen_call(compiler, name, args, *line)?,
        Expr::Binary { op, lhs, rhs, line } if op.is_logical() => {
            if context == ExprContext::Value {
                return Err(invalid_operator(compiler, &op.to_string(), *line));
            }
            gen_short_circuit(compiler, *op, lhs, rhs, *line)?
        }
        Expr::Binary { op, lhs, rhs, line } => {
            let lhs = gen_expr_in(compiler, lhs, context)?;
            let rhs = gen_expr_in(compiler, rhs, context)?;
            gen_binary(compiler, *op, lhs, rhs, *line)?
        }
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
            line,
        } => {
            if context == ExprContext::Value {
                return Err(invalid_operator(compiler, "!", *line));
            }
            let operand = gen_expr_in(compiler, operand, context)?;
            let truth = to_bool(compiler, &operand, *line)?;
            let negated = compiler
                .builder
                .build_not(truth, "not")
                .at_line(&compiler.file_name, *line)?;
            bool_to_int(compiler, negated, *line)?
        }
        Expr::Unary { op, operand, line } => {
            let operand = gen_expr_in(compiler, operand, context)?;
            gen_unary(compiler, *op, operand, *line)?
        }
    };

    if context == ExprContext::Condition && value.ty.is_vector() {
        return Err(compiler.error(ErrorImpl::VectorInCondition, expression.line()));
    }
    Ok(value)
}

fn invalid_operator(compiler: &Compiler<'_>, operator: &str, line: u32) -> Error {
    compiler.error(
        ErrorImpl::InvalidOperator {
            operator: operator.to_string(),
            context: String::from("value expressions"),
        },
        line,
    )
}

fn type_mismatch(compiler: &Compiler<'_>, expected: &str, received: &Type, line: u32) -> Error {
    compiler.error(
        ErrorImpl::TypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        line,
    )
}

fn bool_to_int<'a>(
    compiler: &Compiler<'a>,
    value: IntValue<'a>,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    let extended = compiler
        .builder
        .build_int_z_extend(value, compiler.context.i32_type(), "zext")
        .at_line(&compiler.file_name, line)?;
    Ok(TypedValue::new(extended, Type::Int))
}

/// Reduces a scalar to `i1`: any non-zero value is true.
pub fn to_bool<'a>(
    compiler: &Compiler<'a>,
    value: &TypedValue<'a>,
    line: u32,
) -> Result<IntValue<'a>, Error> {
    match value.ty {
        Type::Int => compiler.builder.build_int_compare(
            IntPredicate::NE,
            value.value.into_int_value(),
            compiler.context.i32_type().const_zero(),
            "tobool",
        ),
        Type::Float => compiler.builder.build_float_compare(
            FloatPredicate::UNE,
            value.value.into_float_value(),
            compiler.context.f32_type().const_zero(),
            "tobool",
        ),
        Type::Vector(..) => return Err(compiler.error(ErrorImpl::VectorInCondition, line)),
        ref other => return Err(type_mismatch(compiler, "int or float", other, line)),
    }
    .at_line(&compiler.file_name, line)
}

/// Lowers `&&` and `||` so the right operand only runs when it decides the
/// result. The result is an `int` 0 or 1.
fn gen_short_circuit<'a>(
    compiler: &Compiler<'a>,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    let lhs_value = gen_expr_in(compiler, lhs, ExprContext::Condition)?;
    let lhs_truth = to_bool(compiler, &lhs_value, lhs.line())?;
    let lhs_block = compiler.insert_block(line)?;

    let is_and = op == BinaryOp::And;
    let rhs_block = compiler.append_block(if is_and { "and.rhs" } else { "or.rhs" }, line)?;
    let end_block = compiler.append_block(if is_and { "and.end" } else { "or.end" }, line)?;

    if is_and {
        compiler
            .builder
            .build_conditional_branch(lhs_truth, rhs_block, end_block)
    } else {
        compiler
            .builder
            .build_conditional_branch(lhs_truth, end_block, rhs_block)
    }
    .at_line(&compiler.file_name, line)?;

    compiler.builder.position_at_end(rhs_block);
    let rhs_value = gen_expr_in(compiler, rhs, ExprContext::Condition)?;
    let rhs_truth = to_bool(compiler, &rhs_value, rhs.line())?;
    // The right operand may have branched; the phi needs the block it ended in.
    let rhs_end = compiler.insert_block(line)?;
    compiler
        .builder
        .build_unconditional_branch(end_block)
        .at_line(&compiler.file_name, line)?;

    compiler.builder.position_at_end(end_block);
    let bool_type = compiler.context.bool_type();
    let phi = compiler
        .builder
        .build_phi(bool_type, "logic")
        .at_line(&compiler.file_name, line)?;
    let decided = bool_type.const_int(if is_and { 0 } else { 1 }, false);
    phi.add_incoming(&[(&decided, lhs_block), (&rhs_truth, rhs_end)]);

    bool_to_int(compiler, phi.as_basic_value().into_int_value(), line)
}

fn int_predicate(op: BinaryOp) -> Option<IntPredicate> {
    Some(match op {
        BinaryOp::Lt => IntPredicate::SLT,
        BinaryOp::Gt => IntPredicate::SGT,
        BinaryOp::Le => IntPredicate::SLE,
        BinaryOp::Ge => IntPredicate::SGE,
        BinaryOp::Eq => IntPredicate::EQ,
        BinaryOp::Ne => IntPredicate::NE,
        _ => return None,
    })
}

fn float_predicate(op: BinaryOp) -> Option<FloatPredicate> {
    Some(match op {
        BinaryOp::Lt => FloatPredicate::OLT,
        BinaryOp::Gt => FloatPredicate::OGT,
        BinaryOp::Le => FloatPredicate::OLE,
        BinaryOp::Ge => FloatPredicate::OGE,
        BinaryOp::Eq => FloatPredicate::OEQ,
        BinaryOp::Ne => FloatPredicate::UNE,
        _ => return None,
    })
}

fn int_arithmetic<'a, T: IntMathValue<'a>>(
    compiler: &Compiler<'a>,
    op: BinaryOp,
    lhs: T,
    rhs: T,
    line: u32,
) -> Result<T, Error> {
    let builder = &compiler.builder;
    match op {
        BinaryOp::Add => builder.build_int_add(lhs, rhs, "add"),
        BinaryOp::Sub => builder.build_int_sub(lhs, rhs, "sub"),
        BinaryOp::Mul => builder.build_int_mul(lhs, rhs, "mul"),
        BinaryOp::Div => builder.build_int_signed_div(lhs, rhs, "div"),
        BinaryOp::Mod => builder.build_int_signed_rem(lhs, rhs, "rem"),
        other => return Err(invalid_operator(compiler, &other.to_string(), line)),
    }
    .at_line(&compiler.file_name, line)
}

fn float_arithmetic<'a, T: FloatMathValue<'a>>(
    compiler: &Compiler<'a>,
    op: BinaryOp,
    lhs: T,
    rhs: T,
    line: u32,
) -> Result<T, Error> {
    let builder = &compiler.builder;
    match op {
        BinaryOp::Add => builder.build_float_add(lhs, rhs, "fadd"),
        BinaryOp::Sub => builder.build_float_sub(lhs, rhs, "fsub"),
        BinaryOp::Mul => builder.build_float_mul(lhs, rhs, "fmul"),
        BinaryOp::Div => builder.build_float_div(lhs, rhs, "fdiv"),
        BinaryOp::Mod => builder.build_float_rem(lhs, rhs, "frem"),
        other => return Err(invalid_operator(compiler, &other.to_string(), line)),
    }
    .at_line(&compiler.file_name, line)
}

fn is_static_zero(value: IntValue<'_>) -> bool {
    value.is_const() && value.get_zero_extended_constant() == Some(0)
}

/// True if `vector` is a constant with at least one zero lane.
fn has_static_zero_lane<'a>(compiler: &Compiler<'a>, vector: VectorValue<'a>, length: usize) -> bool {
    vector.is_const()
        && (0..length).any(|lane| {
            let index = compiler.context.i32_type().const_int(lane as u64, false);
            match vector.const_extract_element(index) {
                BasicValueEnum::IntValue(value) => is_static_zero(value),
                _ => false,
            }
        })
}

/// Lowers a non-logical binary operator on two already lowered operands.
pub fn gen_binary<'a>(
    compiler: &Compiler<'a>,
    op: BinaryOp,
    lhs: TypedValue<'a>,
    rhs: TypedValue<'a>,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    if lhs.ty.is_vector() || rhs.ty.is_vector() {
        return gen_vector_binary(compiler, op, lhs, rhs, line);
    }

    let (Some(lhs_kind), Some(rhs_kind)) = (lhs.ty.scalar_kind(), rhs.ty.scalar_kind()) else {
        let received = if lhs.ty.is_scalar() { &rhs.ty } else { &lhs.ty };
        return Err(type_mismatch(compiler, "int or float", received, line));
    };

    if lhs_kind == ScalarKind::Int && rhs_kind == ScalarKind::Int {
        let lhs = lhs.value.into_int_value();
        let rhs = rhs.value.into_int_value();

        if let Some(predicate) = int_predicate(op) {
            let compared = compiler
                .builder
                .build_int_compare(predicate, lhs, rhs, "cmp")
                .at_line(&compiler.file_name, line)?;
            return bool_to_int(compiler, compared, line);
        }

        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && is_static_zero(rhs) {
            return Err(compiler.error(ErrorImpl::DivisionByZero, line));
        }

        let result = int_arithmetic(compiler, op, lhs, rhs, line)?;
        return Ok(TypedValue::new(result, Type::Int));
    }

    let lhs = convert_scalar(compiler, lhs, ScalarKind::Float, line)?
        .value
        .into_float_value();
    let rhs = convert_scalar(compiler, rhs, ScalarKind::Float, line)?
        .value
        .into_float_value();

    if let Some(predicate) = float_predicate(op) {
        let compared = compiler
            .builder
            .build_float_compare(predicate, lhs, rhs, "fcmp")
            .at_line(&compiler.file_name, line)?;
        return bool_to_int(compiler, compared, line);
    }

    if op == BinaryOp::Mod {
        return Ok(TypedValue::new(
            compiler.context.f32_type().const_zero(),
            Type::Float,
        ));
    }

    let result = float_arithmetic(compiler, op, lhs, rhs, line)?;
    Ok(TypedValue::new(result, Type::Float))
}

fn gen_vector_binary<'a>(
    compiler: &Compiler<'a>,
    op: BinaryOp,
    lhs: TypedValue<'a>,
    rhs: TypedValue<'a>,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    if !op.is_arithmetic() {
        return Err(compiler.error(
            ErrorImpl::InvalidVectorOperation {
                message: format!("operator `{}` is not defined on vectors", op),
            },
            line,
        ));
    }

    if lhs.ty.is_vector() && rhs.ty.is_vector() && lhs.ty != rhs.ty {
        return Err(type_mismatch(compiler, &lhs.ty.to_string(), &rhs.ty, line));
    }

    let vector_type = if lhs.ty.is_vector() {
        lhs.ty.clone()
    } else {
        rhs.ty.clone()
    };
    let Type::Vector(kind, length) = vector_type else {
        return Err(type_mismatch(compiler, "vector", &vector_type, line));
    };

    if kind == ScalarKind::Float && op == BinaryOp::Mod {
        return Err(compiler.error(
            ErrorImpl::InvalidVectorOperation {
                message: String::from("`%` is not defined on float vectors"),
            },
            line,
        ));
    }

    let divides = kind == ScalarKind::Int && matches!(op, BinaryOp::Div | BinaryOp::Mod);
    if divides && rhs.ty == Type::Int && is_static_zero(rhs.value.into_int_value()) {
        return Err(compiler.error(ErrorImpl::DivisionByZero, line));
    }

    let lhs = broadcast(compiler, lhs, kind, length, line)?;
    let rhs = broadcast(compiler, rhs, kind, length, line)?;

    if divides && has_static_zero_lane(compiler, rhs, length) {
        return Err(compiler.error(ErrorImpl::DivisionByZero, line));
    }

    let result = match kind {
        ScalarKind::Int => int_arithmetic(compiler, op, lhs, rhs, line)?,
        ScalarKind::Float => float_arithmetic(compiler, op, lhs, rhs, line)?,
    };
    Ok(TypedValue::new(result, vector_type))
}

/// Splats a scalar across every lane. Vectors pass through unchanged.
fn broadcast<'a>(
    compiler: &Compiler<'a>,
    value: TypedValue<'a>,
    kind: ScalarKind,
    length: usize,
    line: u32,
) -> Result<VectorValue<'a>, Error> {
    match value.ty {
        Type::Vector(..) => return Ok(value.value.into_vector_value()),
        Type::Float if kind == ScalarKind::Int => {
            return Err(compiler.error(
                ErrorImpl::InvalidVectorOperation {
                    message: String::from("a float cannot be broadcast to an int vector"),
                },
                line,
            ))
        }
        _ => {}
    }

    let scalar = convert_scalar(compiler, value, kind, line)?.value;
    let mut vector = compiler.vector_type(kind, length).get_undef();
    for lane in 0..length {
        let index = compiler.context.i32_type().const_int(lane as u64, false);
        vector = compiler
            .builder
            .build_insert_element(vector, scalar, index, "splat")
            .at_line(&compiler.file_name, line)?;
    }
    Ok(vector)
}

pub fn gen_unary<'a>(
    compiler: &Compiler<'a>,
    op: UnaryOp,
    operand: TypedValue<'a>,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    let numeric = operand.ty.is_scalar() || operand.ty.is_vector();
    if !numeric {
        return Err(type_mismatch(compiler, "int, float or vector", &operand.ty, line));
    }

    match op {
        UnaryOp::Plus => Ok(operand),
        UnaryOp::Minus => {
            let builder = &compiler.builder;
            let negated = match operand.ty {
                Type::Int => builder
                    .build_int_neg(operand.value.into_int_value(), "neg")
                    .map(BasicValueEnum::from),
                Type::Float => builder
                    .build_float_neg(operand.value.into_float_value(), "fneg")
                    .map(BasicValueEnum::from),
                Type::Vector(ScalarKind::Int, _) => builder
                    .build_int_neg(operand.value.into_vector_value(), "neg")
                    .map(BasicValueEnum::from),
                _ => builder
                    .build_float_neg(operand.value.into_vector_value(), "fneg")
                    .map(BasicValueEnum::from),
            }
            .at_line(&compiler.file_name, line)?;
            Ok(TypedValue {
                value: negated,
                ty: operand.ty,
            })
        }
        UnaryOp::Not => Err(invalid_operator(compiler, "!", line)),
    }
}

/// Converts between `int` and `float` with C semantics.
pub fn convert_scalar<'a>(
    compiler: &Compiler<'a>,
    value: TypedValue<'a>,
    kind: ScalarKind,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    match (&value.ty, kind) {
        (Type::Int, ScalarKind::Int) | (Type::Float, ScalarKind::Float) => Ok(value),
        (Type::Int, ScalarKind::Float) => {
            let converted = compiler
                .builder
                .build_signed_int_to_float(
                    value.value.into_int_value(),
                    compiler.context.f32_type(),
                    "sitofp",
                )
                .at_line(&compiler.file_name, line)?;
            Ok(TypedValue::new(converted, Type::Float))
        }
        (Type::Float, ScalarKind::Int) => {
            let converted = compiler
                .builder
                .build_float_to_signed_int(
                    value.value.into_float_value(),
                    compiler.context.i32_type(),
                    "fptosi",
                )
                .at_line(&compiler.file_name, line)?;
            Ok(TypedValue::new(converted, Type::Int))
        }
        (other, _) => Err(type_mismatch(compiler, &kind.to_string(), other, line)),
    }
}

/// Coerces a value for storage into `target`: scalars convert between `int`
/// and `float`, every other type must already match.
pub fn coerce_to<'a>(
    compiler: &Compiler<'a>,
    value: TypedValue<'a>,
    target: &Type,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    if let Some(kind) = target.scalar_kind() {
        return convert_scalar(compiler, value, kind, line);
    }

    if value.ty == *target {
        Ok(value)
    } else {
        Err(type_mismatch(compiler, &target.to_string(), &value.ty, line))
    }
}
