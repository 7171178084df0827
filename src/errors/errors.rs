use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::InvalidOperator { .. } => "InvalidOperator",
            ErrorImpl::InvalidVectorOperation { .. } => "InvalidVectorOperation",
            ErrorImpl::VectorInCondition => "VectorInCondition",
            ErrorImpl::InvalidArraySize { .. } => "InvalidArraySize",
            ErrorImpl::NonConstantExpression { .. } => "NonConstantExpression",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::IndexOutOfDimensions { .. } => "IndexOutOfDimensions",
            ErrorImpl::InvalidVectorIndex { .. } => "InvalidVectorIndex",
            ErrorImpl::AssignToArray { .. } => "AssignToArray",
            ErrorImpl::AssignToConstant { .. } => "AssignToConstant",
            ErrorImpl::InvalidInitializer { .. } => "InvalidInitializer",
            ErrorImpl::ControlFlowOutsideLoop { .. } => "ControlFlowOutsideLoop",
            ErrorImpl::InvalidReturn { .. } => "InvalidReturn",
            ErrorImpl::MissingMain => "MissingMain",
            ErrorImpl::DuplicateMain => "DuplicateMain",
            ErrorImpl::InvalidMainSignature => "InvalidMainSignature",
            ErrorImpl::StaleParameterPointer { .. } => "StaleParameterPointer",
            ErrorImpl::ScopeUnderflow => "ScopeUnderflow",
            ErrorImpl::InvalidOptimizationLevel { .. } => "InvalidOptimizationLevel",
            ErrorImpl::IrBuilderError { .. } => "IrBuilderError",
            ErrorImpl::ModuleVerificationError { .. } => "ModuleVerificationError",
            ErrorImpl::TargetError { .. } => "TargetError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this scope",
                variable
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::FunctionNotDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` not declared", function))
            }
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at least {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidOperator { operator, context } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be used in {}",
                operator, context
            )),
            ErrorImpl::InvalidVectorOperation { message } => {
                ErrorTip::Suggestion(format!("Invalid vector operation: {}", message))
            }
            ErrorImpl::VectorInCondition => ErrorTip::Suggestion(String::from(
                "Vectors cannot be used in conditions, reduce them with `vsum` first",
            )),
            ErrorImpl::InvalidArraySize { message } => {
                ErrorTip::Suggestion(format!("Invalid size: {}", message))
            }
            ErrorImpl::NonConstantExpression { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::DivisionByZero => ErrorTip::None,
            ErrorImpl::IndexOutOfDimensions {
                variable,
                dimensions,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` has {} dimensions but {} indices were given",
                variable, dimensions, received
            )),
            ErrorImpl::InvalidVectorIndex { variable } => ErrorTip::Suggestion(format!(
                "Vector `{}` must be indexed with exactly one index",
                variable
            )),
            ErrorImpl::AssignToArray { variable } => ErrorTip::Suggestion(format!(
                "Cannot assign to array `{}`, index a single element instead",
                variable
            )),
            ErrorImpl::AssignToConstant { variable } => {
                ErrorTip::Suggestion(format!("`{}` is a constant", variable))
            }
            ErrorImpl::InvalidInitializer { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::ControlFlowOutsideLoop { statement } => {
                ErrorTip::Suggestion(format!("`{}` must be inside a while loop", statement))
            }
            ErrorImpl::InvalidReturn { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::MissingMain => {
                ErrorTip::Suggestion(String::from("Define `int main()` as the entry point"))
            }
            ErrorImpl::DuplicateMain => ErrorTip::Suggestion(String::from(
                "Only one `main` function may be defined",
            )),
            ErrorImpl::InvalidMainSignature => ErrorTip::Suggestion(String::from(
                "`main` must take no parameters and return int",
            )),
            ErrorImpl::StaleParameterPointer { .. } => ErrorTip::None,
            ErrorImpl::ScopeUnderflow => ErrorTip::None,
            ErrorImpl::InvalidOptimizationLevel { level } => ErrorTip::Suggestion(format!(
                "Optimization level {} is not between 0 and 3",
                level
            )),
            ErrorImpl::IrBuilderError { .. } => ErrorTip::None,
            ErrorImpl::ModuleVerificationError { message } => {
                ErrorTip::Suggestion(message.trim().to_string())
            }
            ErrorImpl::TargetError { message } => ErrorTip::Suggestion(message.clone()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.internal_error, self.position.1, self.position.0
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("function {function:?} not declared")]
    FunctionNotDeclared { function: String },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("argument types do not match: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("operator {operator:?} is not allowed in {context}")]
    InvalidOperator { operator: String, context: String },
    #[error("invalid vector operation: {message}")]
    InvalidVectorOperation { message: String },
    #[error("vector value used in a condition")]
    VectorInCondition,
    #[error("invalid array size: {message}")]
    InvalidArraySize { message: String },
    #[error("expression is not constant: {message}")]
    NonConstantExpression { message: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{variable:?} indexed with {received} indices but has {dimensions} dimensions")]
    IndexOutOfDimensions {
        variable: String,
        dimensions: usize,
        received: usize,
    },
    #[error("vector {variable:?} must be indexed with exactly one index")]
    InvalidVectorIndex { variable: String },
    #[error("cannot assign to array {variable:?}")]
    AssignToArray { variable: String },
    #[error("cannot assign to constant {variable:?}")]
    AssignToConstant { variable: String },
    #[error("invalid initializer: {message}")]
    InvalidInitializer { message: String },
    #[error("{statement} outside of loop")]
    ControlFlowOutsideLoop { statement: String },
    #[error("invalid return: {message}")]
    InvalidReturn { message: String },
    #[error("no main function defined")]
    MissingMain,
    #[error("multiple main functions defined")]
    DuplicateMain,
    #[error("main function must have no parameters and return int")]
    InvalidMainSignature,
    #[error("parameter {variable:?} resolved outside of the function that loaded it")]
    StaleParameterPointer { variable: String },
    #[error("cannot pop scope: no scope is open")]
    ScopeUnderflow,
    #[error("invalid optimization level {level}")]
    InvalidOptimizationLevel { level: u8 },
    #[error("IR builder error: {message}")]
    IrBuilderError { message: String },
    #[error("module verification failed: {message}")]
    ModuleVerificationError { message: String },
    #[error("target setup failed: {message}")]
    TargetError { message: String },
}
