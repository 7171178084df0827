//! Property tests for constant folding.
//!
//! Folding must reach a fixed point in one pass, agree with integer division
//! as truncation toward zero, and compute the same value the lowered program
//! computes at run time.

use inkwell::{context::Context, OptimizationLevel};
use proptest::prelude::*;
use vecsy::{
    ast::{
        ast::{CompUnit, Function},
        expressions::{BinaryOp, Expr, UnaryOp},
        statements::{Block, Stmt},
        types::TypeNode,
    },
    compiler::{compiler::Compiler, options::CompileOptions},
    optimizer::constant_folding::ConstantFolder,
    types::const_eval::{fold_binary, ConstError, ConstValue},
};

fn binary_op() -> impl Strategy<Value = BinaryOp> {
    prop::sample::select(vec![
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Lt,
        BinaryOp::Ge,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::And,
        BinaryOp::Or,
    ])
}

fn unary_op() -> impl Strategy<Value = UnaryOp> {
    prop::sample::select(vec![UnaryOp::Plus, UnaryOp::Minus, UnaryOp::Not])
}

/// Trees over literals, names and calls, including divisions by zero.
fn any_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-20i32..20).prop_map(Expr::int),
        (-20i32..20).prop_map(|value| Expr::float(value as f32 / 4.0)),
        "[a-c]".prop_map(|name| Expr::var(&name)),
    ];

    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (binary_op(), inner.clone(), inner.clone())
                .prop_map(|(op, lhs, rhs)| Expr::binary(op, lhs, rhs)),
            (unary_op(), inner.clone()).prop_map(|(op, operand)| Expr::unary(op, operand)),
            prop::collection::vec(inner, 0..2).prop_map(|args| Expr::call("f", args)),
        ]
    })
}

/// Integer trees whose operators cannot trap at run time.
fn int_expr() -> impl Strategy<Value = Expr> {
    let ops = prop::sample::select(vec![
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Lt,
        BinaryOp::Eq,
        BinaryOp::Ne,
    ]);

    (-1000i32..1000)
        .prop_map(Expr::int)
        .prop_recursive(4, 24, 2, move |inner| {
            prop_oneof![
                (ops.clone(), inner.clone(), inner.clone())
                    .prop_map(|(op, lhs, rhs)| Expr::binary(op, lhs, rhs)),
                inner.prop_map(|operand| Expr::unary(UnaryOp::Minus, operand)),
            ]
        })
}

/// True if some binary node still has two literal operands that the
/// evaluator would have accepted.
fn has_foldable_node(expr: &Expr) -> bool {
    match expr {
        Expr::Binary { op, lhs, rhs, .. } => {
            let foldable = match (ConstValue::from_expr(lhs), ConstValue::from_expr(rhs)) {
                (Some(l), Some(r)) => fold_binary(*op, l, r).is_ok(),
                _ => false,
            };
            foldable || has_foldable_node(lhs) || has_foldable_node(rhs)
        }
        Expr::Unary { operand, .. } => operand.is_constant() || has_foldable_node(operand),
        Expr::Call { args, .. } => args.iter().any(has_foldable_node),
        Expr::LVal(lval) => lval.indices.iter().any(has_foldable_node),
        _ => false,
    }
}

fn run_unfolded(expr: Expr) -> i32 {
    let unit = CompUnit {
        decls: vec![],
        functions: vec![Function::new(
            TypeNode::Int,
            "main",
            vec![],
            Block::new(vec![Stmt::ret(Some(expr)).into()]),
        )],
    };

    let context = Context::create();
    let mut compiler = Compiler::new(CompileOptions::default(), &context);
    compiler.lower(&unit).unwrap();
    compiler.configure_host_target().unwrap();

    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();
    let result = unsafe {
        engine
            .get_function::<unsafe extern "C" fn() -> i32>("main")
            .unwrap()
            .call()
    };
    result
}

proptest! {
    #[test]
    fn test_folding_is_idempotent(expr in any_expr()) {
        let mut folder = ConstantFolder::new();
        let mut once = expr.clone();
        folder.fold_expr(&mut once);

        let mut twice = once.clone();
        prop_assert!(!folder.fold_expr(&mut twice));
        prop_assert_eq!(twice, once.clone());
        prop_assert!(!has_foldable_node(&once));
    }

    #[test]
    fn test_int_division_truncates_toward_zero(a in any::<i32>(), b in any::<i32>()) {
        prop_assume!(b != 0 && !(a == i32::MIN && b == -1));

        let quotient = fold_binary(BinaryOp::Div, ConstValue::Int(a), ConstValue::Int(b)).unwrap();
        let remainder = fold_binary(BinaryOp::Mod, ConstValue::Int(a), ConstValue::Int(b)).unwrap();
        let (q, r) = (quotient.as_int(), remainder.as_int());

        prop_assert_eq!(q.wrapping_mul(b).wrapping_add(r), a);
        prop_assert!(r == 0 || (r < 0) == (a < 0));
        prop_assert!(r.unsigned_abs() < b.unsigned_abs());
    }

    #[test]
    fn test_int_division_refuses_traps(a in any::<i32>()) {
        prop_assert_eq!(
            fold_binary(BinaryOp::Div, ConstValue::Int(a), ConstValue::Int(0)),
            Err(ConstError::DivisionByZero)
        );
        prop_assert_eq!(
            fold_binary(BinaryOp::Mod, ConstValue::Int(a), ConstValue::Int(0)),
            Err(ConstError::DivisionByZero)
        );
        prop_assert_eq!(
            fold_binary(BinaryOp::Div, ConstValue::Int(i32::MIN), ConstValue::Int(-1)),
            Err(ConstError::Overflow)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_folded_value_matches_execution(expr in int_expr()) {
        let mut folded = expr.clone();
        ConstantFolder::new().fold_expr(&mut folded);

        let Expr::IntConst { value, .. } = folded else {
            return Err(TestCaseError::fail(format!("not folded to a literal: {:?}", folded)));
        };
        prop_assert_eq!(run_unfolded(expr), value);
    }
}
