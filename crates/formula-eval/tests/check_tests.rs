//! Tests for offline formula type checking against synthetic environments.

use formula_eval::check::{check, dummy_environment, parse_requirements, CheckOutcome};
use formula_eval::{Environment, Value};
use formula_types::ast::{BinOp, Expr, UnresolvedName};
use formula_types::ValueType;

fn requirements() -> formula_eval::check::Requirements {
    parse_requirements(
        r#"{
            "price": "number",
            "title": "text",
            "sold_at": "timestamp",
            "tags": ["text"],
            "flag": "bool"
        }"#,
    )
    .expect("valid requirements")
}

#[test]
fn top_level_fields() {
    let mut env = dummy_environment(None, true, None, &requirements());
    let formula = Expr::binary(Expr::name("price"), BinOp::Mul, Expr::number(2.0));
    assert_eq!(
        check(&[formula], &mut env, &ValueType::Number),
        CheckOutcome::Passed
    );
    assert_eq!(env.lookup("tags", None), Some(Value::array(ValueType::Text, vec![])));
    assert_eq!(env.lookup("flag", None), Some(Value::text("a")));
}

#[test]
fn namespaced_fields() {
    let mut env = dummy_environment(None, true, Some("item"), &requirements());
    assert_eq!(env.lookup("price", None), None);
    let formula = Expr::binary(
        Expr::resolve(Expr::name("item"), "title"),
        BinOp::Add,
        Expr::string("\"!\""),
    );
    assert_eq!(
        check(&[formula], &mut env, &ValueType::Text),
        CheckOutcome::Passed
    );
}

#[test]
fn mismatch_reports_both_types() {
    let mut env = dummy_environment(None, true, None, &requirements());
    let formula = Expr::binary(Expr::name("title"), BinOp::Add, Expr::name("price"));
    assert_eq!(
        check(&[formula], &mut env, &ValueType::Number),
        CheckOutcome::Mismatch {
            expected: ValueType::Number,
            actual: ValueType::Text,
        }
    );
}

#[test]
fn errors_become_messages() {
    let mut env = dummy_environment(None, true, None, &requirements());
    let formula = Expr::binary(Expr::name("sold_at"), BinOp::Less, Expr::name("price"));
    assert_eq!(
        check(&[formula], &mut env, &ValueType::Bool),
        CheckOutcome::Failed {
            message: "argument type error: '<' expects (ord, ord), got (timestamp, number)"
                .into()
        }
    );
}

#[test]
fn formulas_share_one_environment() {
    let reqs = requirements();
    let fields = dummy_environment(None, true, None, &reqs);
    let mut env = dummy_environment(Some(fields), false, None, &Default::default());
    let formulas = vec![
        Expr::assign(
            vec![UnresolvedName::from_path(&["total"]).unwrap()],
            Expr::binary(Expr::name("price"), BinOp::Add, Expr::number(1.0)),
        ),
        Expr::binary(Expr::name("total"), BinOp::GreaterEq, Expr::number(0.0)),
    ];
    assert_eq!(check(&formulas, &mut env, &ValueType::Bool), CheckOutcome::Passed);
}

#[test]
fn read_only_environment_rejects_assignment() {
    let mut env = dummy_environment(None, true, None, &requirements());
    let formula = Expr::assign(
        vec![UnresolvedName::from_path(&["price"]).unwrap()],
        Expr::number(1.0),
    );
    assert!(matches!(
        check(&[formula], &mut env, &ValueType::Number),
        CheckOutcome::Failed { .. }
    ));
}

#[test]
fn no_formulas() {
    let mut env = Environment::new();
    assert_eq!(check(&[], &mut env, &ValueType::Number), CheckOutcome::Empty);
}
