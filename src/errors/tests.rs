//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::{format_error, Position};
use std::rc::Rc;

fn at(line: u32) -> Position {
    Position(line, Rc::new("test.sy".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "x".to_string(),
        },
        at(10),
    );

    assert_eq!(error.get_error_name(), "VariableNotDeclared");
}

#[test]
fn test_error_position() {
    let error = Error::new(ErrorImpl::DivisionByZero, at(42));

    assert_eq!(error.get_position().0, 42);
    assert_eq!(error.get_position().1.as_str(), "test.sy");
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: "vector<int, 4>".to_string(),
            received: "vector<int, 3>".to_string(),
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "TypeMatchError");
    assert_eq!(
        error.get_tip().to_string(),
        "Expected type `vector<int, 4>`, received `vector<int, 3>`"
    );
}

#[test]
fn test_variable_already_declared_error() {
    let error = Error::new(
        ErrorImpl::VariableAlreadyDeclared {
            variable: "x".to_string(),
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
}

#[test]
fn test_entry_point_errors() {
    assert_eq!(
        Error::new(ErrorImpl::MissingMain, at(0)).get_error_name(),
        "MissingMain"
    );
    assert_eq!(
        Error::new(ErrorImpl::DuplicateMain, at(0)).get_error_name(),
        "DuplicateMain"
    );
    assert_eq!(
        Error::new(ErrorImpl::InvalidMainSignature, at(0)).get_error_name(),
        "InvalidMainSignature"
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::ScopeUnderflow, at(0));

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::ControlFlowOutsideLoop {
            statement: "break".to_string(),
        },
        at(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("break")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_arguments_errors() {
    let error = Error::new(
        ErrorImpl::UnexpectedArguments {
            expected: 2,
            received: 3,
        },
        at(0),
    );
    assert_eq!(error.get_error_name(), "UnexpectedArguments");

    let error = Error::new(
        ErrorImpl::MissingArguments {
            expected: 3,
            received: 1,
        },
        at(0),
    );
    assert_eq!(error.get_error_name(), "MissingArguments");
}

#[test]
fn test_error_display() {
    let error = Error::new(ErrorImpl::DivisionByZero, at(7));

    assert_eq!(error.to_string(), "division by zero at test.sy:7");
}

#[test]
fn test_format_error() {
    let error = Error::new(
        ErrorImpl::AssignToConstant {
            variable: "N".to_string(),
        },
        at(3),
    );

    let report = format_error(&error);
    assert_eq!(report, "Error: AssignToConstant (`N` is a constant)\n-> test.sy:3");

    let report = format_error(&Error::new(ErrorImpl::DivisionByZero, at(1)));
    assert_eq!(report, "Error: DivisionByZero\n-> test.sy:1");
}
