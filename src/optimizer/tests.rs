//! Unit tests for constant folding and the pass driver.

use crate::ast::{
    ast::{CompUnit, Decl, Def, Function, Initializer},
    expressions::{BinaryOp, Expr, LVal, UnaryOp},
    statements::{Block, BlockItem, Stmt},
    types::{ScalarKind, TypeNode},
};

use super::{constant_folding::ConstantFolder, optimizer::AstOptimizer};

fn fold(mut expr: Expr) -> Expr {
    ConstantFolder::new().fold_expr(&mut expr);
    expr
}

fn main_returning(expr: Expr) -> CompUnit {
    CompUnit {
        decls: vec![],
        functions: vec![Function::new(
            TypeNode::Int,
            "main",
            vec![],
            Block::new(vec![Stmt::ret(Some(expr)).into()]),
        )],
    }
}

#[test]
fn test_fold_nested_arithmetic() {
    let expr = Expr::binary(
        BinaryOp::Add,
        Expr::int(1),
        Expr::binary(BinaryOp::Mul, Expr::int(2), Expr::int(3)),
    )
    .at(5);

    assert_eq!(fold(expr), Expr::IntConst { value: 7, line: 5 });
}

#[test]
fn test_fold_division_semantics() {
    assert_eq!(fold(Expr::binary(BinaryOp::Div, Expr::int(7), Expr::int(2))), Expr::int(3));
    assert_eq!(
        fold(Expr::binary(
            BinaryOp::Div,
            Expr::unary(UnaryOp::Minus, Expr::int(7)),
            Expr::int(2)
        )),
        Expr::int(-3)
    );
    assert_eq!(
        fold(Expr::binary(
            BinaryOp::Mod,
            Expr::int(7),
            Expr::unary(UnaryOp::Minus, Expr::int(2))
        )),
        Expr::int(1)
    );
}

#[test]
fn test_fold_mixed_promotes() {
    assert_eq!(
        fold(Expr::binary(BinaryOp::Add, Expr::int(3), Expr::float(2.5))),
        Expr::float(5.5)
    );
}

#[test]
fn test_division_by_zero_is_left_alone() {
    let expr = Expr::binary(
        BinaryOp::Div,
        Expr::var("x"),
        Expr::binary(BinaryOp::Sub, Expr::int(1), Expr::int(1)),
    );
    let folded = fold(expr);

    assert_eq!(
        folded,
        Expr::binary(BinaryOp::Div, Expr::var("x"), Expr::int(0))
    );

    let untouched = Expr::binary(BinaryOp::Mod, Expr::int(4), Expr::int(0));
    let mut copy = untouched.clone();
    assert!(!ConstantFolder::new().fold_expr(&mut copy));
    assert_eq!(copy, untouched);
}

#[test]
fn test_calls_and_lvalues_are_not_constant() {
    let expr = Expr::binary(
        BinaryOp::Add,
        Expr::call("getint", vec![Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(1))]),
        Expr::index("a", vec![Expr::binary(BinaryOp::Mul, Expr::int(2), Expr::int(2))]),
    );

    assert_eq!(
        fold(expr),
        Expr::binary(
            BinaryOp::Add,
            Expr::call("getint", vec![Expr::int(2)]),
            Expr::index("a", vec![Expr::int(4)]),
        )
    );
}

#[test]
fn test_fold_statements_and_declarations() {
    let mut unit = CompUnit {
        decls: vec![Decl::Var {
            ty: TypeNode::vector(
                ScalarKind::Int,
                Expr::binary(BinaryOp::Add, Expr::int(2), Expr::int(2)),
            ),
            defs: vec![Def::new(
                "v",
                vec![],
                Some(Initializer::List(vec![
                    Initializer::Expr(Expr::binary(BinaryOp::Sub, Expr::int(5), Expr::int(4))),
                    Initializer::List(vec![Initializer::Expr(Expr::unary(
                        UnaryOp::Minus,
                        Expr::float(1.5),
                    ))]),
                ])),
            )],
        }],
        functions: vec![Function::new(
            TypeNode::Int,
            "main",
            vec![],
            Block::new(vec![
                Stmt::while_loop(
                    Expr::binary(BinaryOp::Lt, Expr::int(1), Expr::int(2)),
                    Stmt::block(vec![Stmt::assign(
                        LVal::new("a", vec![Expr::binary(BinaryOp::Add, Expr::int(0), Expr::int(1))]),
                        Expr::binary(BinaryOp::Mul, Expr::int(3), Expr::int(3)),
                    )
                    .into()]),
                )
                .into(),
                Stmt::ret(Some(Expr::int(0))).into(),
            ]),
        )],
    };

    assert!(ConstantFolder::new().fold(&mut unit));

    let Decl::Var { ty, defs } = &unit.decls[0] else {
        panic!("expected a variable declaration");
    };
    assert_eq!(ty, &TypeNode::vector(ScalarKind::Int, Expr::int(4)));
    assert_eq!(
        defs[0].init,
        Some(Initializer::List(vec![
            Initializer::Expr(Expr::int(1)),
            Initializer::List(vec![Initializer::Expr(Expr::float(-1.5))]),
        ]))
    );

    let body = &unit.functions[0].body;
    assert_eq!(
        body.items[0],
        BlockItem::Stmt(Stmt::while_loop(
            Expr::int(1),
            Stmt::block(vec![Stmt::assign(
                LVal::new("a", vec![Expr::int(1)]),
                Expr::int(9)
            )
            .into()]),
        ))
    );
}

#[test]
fn test_second_pass_reports_no_change() {
    let mut unit = main_returning(Expr::binary(
        BinaryOp::Add,
        Expr::int(1),
        Expr::binary(BinaryOp::Mul, Expr::int(2), Expr::int(3)),
    ));

    let mut folder = ConstantFolder::new();
    assert!(folder.fold(&mut unit));
    let once = unit.clone();
    assert!(!folder.fold(&mut unit));
    assert_eq!(unit, once);
}

#[test]
fn test_unchanged_tree_reports_no_change() {
    let mut unit = main_returning(Expr::binary(BinaryOp::Add, Expr::var("a"), Expr::int(1)));

    assert!(!ConstantFolder::new().fold(&mut unit));
}

#[test]
fn test_optimizer_stops_at_fixed_point() {
    let mut unit = main_returning(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)));

    let report = AstOptimizer::new(8).optimize(&mut unit);

    assert_eq!(report.passes, 2);
    assert!(report.changed);
    assert_eq!(report.rewrites, 1);
    assert_eq!(
        unit.functions[0].body.items[0],
        BlockItem::Stmt(Stmt::ret(Some(Expr::int(3))))
    );
}

#[test]
fn test_optimizer_respects_pass_cap() {
    let mut unit = main_returning(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)));

    let report = AstOptimizer::new(1).optimize(&mut unit);
    assert_eq!(report.passes, 1);

    let mut untouched = main_returning(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)));
    let report = AstOptimizer::new(0).optimize(&mut untouched);
    assert_eq!(report.passes, 0);
    assert!(!report.changed);
}
