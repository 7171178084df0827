use std::rc::Rc;

use inkwell::{builder::BuilderError, values::BasicValueEnum};

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::types::Type,
    Position,
};

/// A lowered value together with its source-level type.
///
/// LLVM alone cannot tell an `int` comparison result from an `int`, or which
/// element type a decayed pointer refers to, so the type travels alongside.
#[derive(Debug, Clone)]
pub struct TypedValue<'a> {
    pub value: BasicValueEnum<'a>,
    pub ty: Type,
}

impl<'a> TypedValue<'a> {
    pub fn new(value: impl Into<BasicValueEnum<'a>>, ty: Type) -> Self {
        TypedValue {
            value: value.into(),
            ty,
        }
    }
}

/// Attaches a source position to failures coming out of the IR builder.
pub trait IrResult<T> {
    fn at_line(self, file_name: &Rc<String>, line: u32) -> Result<T, Error>;
}

impl<T> IrResult<T> for Result<T, BuilderError> {
    fn at_line(self, file_name: &Rc<String>, line: u32) -> Result<T, Error> {
        self.map_err(|error| {
            Error::new(
                ErrorImpl::IrBuilderError {
                    message: error.to_string(),
                },
                Position(line, Rc::clone(file_name)),
            )
        })
    }
}
