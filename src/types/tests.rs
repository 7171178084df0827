//! Unit tests for the type model and the constant evaluator.

use std::{collections::HashMap, rc::Rc};

use crate::ast::{
    expressions::{BinaryOp, Expr, UnaryOp},
    types::{ScalarKind, TypeNode},
};

use super::{
    const_eval::{
        fold_binary, fold_unary, ConstBinding, ConstError, ConstEvaluator, ConstValue,
        ConstantLookup, SizeBound,
    },
    types::Type,
};

struct Constants(HashMap<&'static str, ConstBinding>);

impl ConstantLookup for Constants {
    fn lookup_constant(&self, name: &str) -> ConstBinding {
        self.0.get(name).copied().unwrap_or(ConstBinding::Undefined)
    }
}

fn constants() -> Constants {
    Constants(HashMap::from([
        ("N", ConstBinding::Value(ConstValue::Int(4))),
        ("PI", ConstBinding::Value(ConstValue::Float(3.14))),
        ("local", ConstBinding::NotConstant),
    ]))
}

fn file() -> Rc<String> {
    Rc::new("test.sy".to_string())
}

#[test]
fn test_with_dims_nests_outermost_first() {
    let ty = Type::with_dims(Type::Int, &[3, 2]);

    assert_eq!(
        ty,
        Type::Array(Box::new(Type::Array(Box::new(Type::Int), 2)), 3)
    );
    assert_eq!(ty.array_dims(), vec![3, 2]);
    assert_eq!(ty.flat_len(), 6);
    assert_eq!(ty.base_element(), &Type::Int);
    assert_eq!(ty.peel(1), Some(&Type::Array(Box::new(Type::Int), 2)));
    assert_eq!(ty.peel(3), None);
}

#[test]
fn test_type_display() {
    assert_eq!(Type::with_dims(Type::Float, &[3, 2]).to_string(), "float[3][2]");
    assert_eq!(Type::Vector(ScalarKind::Int, 4).to_string(), "vector<int, 4>");
    assert_eq!(Type::Pointer(Box::new(Type::Int)).to_string(), "int*");
}

#[test]
fn test_structural_equality() {
    assert_eq!(
        Type::Vector(ScalarKind::Int, 4),
        Type::Vector(ScalarKind::Int, 4)
    );
    assert_ne!(
        Type::Vector(ScalarKind::Int, 4),
        Type::Vector(ScalarKind::Float, 4)
    );
    assert_ne!(
        Type::Vector(ScalarKind::Int, 4),
        Type::Vector(ScalarKind::Int, 3)
    );
}

#[test]
fn test_integer_division_truncates() {
    let div = |l, r| fold_binary(BinaryOp::Div, ConstValue::Int(l), ConstValue::Int(r));
    let rem = |l, r| fold_binary(BinaryOp::Mod, ConstValue::Int(l), ConstValue::Int(r));

    assert_eq!(div(7, 2), Ok(ConstValue::Int(3)));
    assert_eq!(div(-7, 2), Ok(ConstValue::Int(-3)));
    assert_eq!(rem(7, -2), Ok(ConstValue::Int(1)));
    assert_eq!(rem(-7, 2), Ok(ConstValue::Int(-1)));
    assert_eq!(div(1, 0), Err(ConstError::DivisionByZero));
    assert_eq!(rem(1, 0), Err(ConstError::DivisionByZero));
    assert_eq!(div(i32::MIN, -1), Err(ConstError::Overflow));
}

#[test]
fn test_mixed_operands_promote_to_float() {
    assert_eq!(
        fold_binary(BinaryOp::Add, ConstValue::Int(3), ConstValue::Float(2.5)),
        Ok(ConstValue::Float(5.5))
    );
    assert_eq!(
        fold_binary(BinaryOp::Mod, ConstValue::Float(5.0), ConstValue::Int(2)),
        Ok(ConstValue::Float(0.0))
    );
    assert_eq!(
        fold_binary(BinaryOp::Lt, ConstValue::Float(1.5), ConstValue::Int(2)),
        Ok(ConstValue::Int(1))
    );
}

#[test]
fn test_logical_and_unary() {
    assert_eq!(
        fold_binary(BinaryOp::And, ConstValue::Int(2), ConstValue::Int(0)),
        Ok(ConstValue::Int(0))
    );
    assert_eq!(
        fold_binary(BinaryOp::Or, ConstValue::Float(0.0), ConstValue::Int(5)),
        Ok(ConstValue::Int(1))
    );
    assert_eq!(fold_unary(UnaryOp::Minus, ConstValue::Int(5)), ConstValue::Int(-5));
    assert_eq!(fold_unary(UnaryOp::Not, ConstValue::Float(0.0)), ConstValue::Int(1));
    assert_eq!(fold_unary(UnaryOp::Plus, ConstValue::Float(1.5)), ConstValue::Float(1.5));
}

#[test]
fn test_cast_truncates_toward_zero() {
    assert_eq!(ConstValue::Float(-2.7).cast(ScalarKind::Int), ConstValue::Int(-2));
    assert_eq!(ConstValue::Int(3).cast(ScalarKind::Float), ConstValue::Float(3.0));
}

#[test]
fn test_eval_size_arithmetic_and_constants() {
    let lookup = constants();
    let evaluator = ConstEvaluator::new(&lookup, file());

    let expr = Expr::binary(
        BinaryOp::Add,
        Expr::binary(BinaryOp::Mul, Expr::var("N"), Expr::int(2)),
        Expr::unary(UnaryOp::Minus, Expr::int(1)),
    );

    assert_eq!(evaluator.eval_size(&expr, SizeBound::Positive).unwrap(), 7);
}

#[test]
fn test_eval_size_rejects_non_constants() {
    let lookup = constants();
    let evaluator = ConstEvaluator::new(&lookup, file());

    let error = evaluator
        .eval_size(&Expr::var("local").at(3), SizeBound::NonNegative)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "NonConstantExpression");
    assert_eq!(error.get_position().0, 3);

    let error = evaluator
        .eval_size(&Expr::var("missing"), SizeBound::NonNegative)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "VariableNotDeclared");

    let error = evaluator
        .eval_size(&Expr::var("PI"), SizeBound::NonNegative)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidArraySize");

    let error = evaluator
        .eval_size(&Expr::call("getint", vec![]), SizeBound::NonNegative)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "NonConstantExpression");

    let error = evaluator
        .eval_size(&Expr::float(2.0), SizeBound::NonNegative)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "NonConstantExpression");
}

#[test]
fn test_eval_size_bounds() {
    let lookup = constants();
    let evaluator = ConstEvaluator::new(&lookup, file());

    assert_eq!(
        evaluator.eval_size(&Expr::int(0), SizeBound::NonNegative).unwrap(),
        0
    );
    assert!(evaluator.eval_size(&Expr::int(0), SizeBound::Positive).is_err());
    assert!(evaluator
        .eval_size(
            &Expr::binary(BinaryOp::Sub, Expr::int(2), Expr::int(5)),
            SizeBound::NonNegative
        )
        .is_err());
    assert!(evaluator.eval_size(&Expr::int(-1), SizeBound::NonNegative).is_err());

    let error = evaluator
        .eval_size(
            &Expr::binary(BinaryOp::Mod, Expr::int(4), Expr::int(0)),
            SizeBound::NonNegative,
        )
        .unwrap_err();
    assert_eq!(error.get_error_name(), "DivisionByZero");
}

#[test]
fn test_eval_scalar() {
    let lookup = constants();
    let evaluator = ConstEvaluator::new(&lookup, file());

    let value = evaluator
        .eval_scalar(&Expr::binary(BinaryOp::Mul, Expr::var("PI"), Expr::int(2)))
        .unwrap();
    assert_eq!(value, ConstValue::Float(6.28));

    let error = evaluator
        .eval_scalar(&Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0)))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "DivisionByZero");

    let error = evaluator.eval_scalar(&Expr::var("local")).unwrap_err();
    assert_eq!(error.get_error_name(), "NonConstantExpression");
}

#[test]
fn test_resolve_type() {
    let lookup = constants();
    let evaluator = ConstEvaluator::new(&lookup, file());

    assert_eq!(evaluator.resolve_type(&TypeNode::Int).unwrap(), Type::Int);
    assert_eq!(
        evaluator
            .resolve_type(&TypeNode::vector(ScalarKind::Float, Expr::var("N")))
            .unwrap(),
        Type::Vector(ScalarKind::Float, 4)
    );
    assert!(evaluator
        .resolve_type(&TypeNode::vector(ScalarKind::Int, Expr::int(0)))
        .is_err());
}
