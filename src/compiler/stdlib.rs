//! Runtime library support.
//!
//! Every module declares the same set of external runtime functions up front.
//! The catalogue records their source names, link symbols and signatures;
//! [`declare_runtime_library`] adds them to the module and makes them callable
//! like user functions.

use inkwell::module::Linkage;
use lazy_static::lazy_static;
use tracing::debug;

use crate::{errors::errors::Error, types::types::Type};

use super::compiler::{Compiler, FunctionSignature};

/// One runtime function as seen from source code.
#[derive(Debug, Clone)]
pub struct LibraryFunction {
    /// Name used at call sites.
    pub name: &'static str,
    /// Symbol the call links against.
    pub symbol: &'static str,
    pub return_type: Type,
    /// Parameters supplied by the caller.
    pub params: Vec<Type>,
    pub variadic: bool,
    /// The call's source line is passed as a leading `int` argument.
    pub line_argument: bool,
}

impl LibraryFunction {
    fn new(name: &'static str, return_type: Type, params: Vec<Type>) -> Self {
        LibraryFunction {
            name,
            symbol: name,
            return_type,
            params,
            variadic: false,
            line_argument: false,
        }
    }

    fn timer(name: &'static str, symbol: &'static str) -> Self {
        LibraryFunction {
            name,
            symbol,
            return_type: Type::Void,
            params: vec![],
            variadic: false,
            line_argument: true,
        }
    }

    /// Parameters of the declared symbol, including the injected line.
    pub fn link_params(&self) -> Vec<Type> {
        let mut params = self.params.clone();
        if self.line_argument {
            params.insert(0, Type::Int);
        }
        params
    }
}

fn int_pointer() -> Type {
    Type::Pointer(Box::new(Type::Int))
}

fn float_pointer() -> Type {
    Type::Pointer(Box::new(Type::Float))
}

lazy_static! {
    pub static ref RUNTIME_LIBRARY: Vec<LibraryFunction> = vec![
        LibraryFunction::new("getint", Type::Int, vec![]),
        LibraryFunction::new("getch", Type::Int, vec![]),
        LibraryFunction::new("getfloat", Type::Float, vec![]),
        LibraryFunction::new("getarray", Type::Int, vec![int_pointer()]),
        LibraryFunction::new("getfarray", Type::Int, vec![float_pointer()]),
        LibraryFunction::new("putint", Type::Void, vec![Type::Int]),
        LibraryFunction::new("putch", Type::Void, vec![Type::Int]),
        LibraryFunction::new("putfloat", Type::Void, vec![Type::Float]),
        LibraryFunction::new("putarray", Type::Void, vec![Type::Int, int_pointer()]),
        LibraryFunction::new("putfarray", Type::Void, vec![Type::Int, float_pointer()]),
        LibraryFunction {
            variadic: true,
            ..LibraryFunction::new("putf", Type::Void, vec![Type::Str])
        },
        LibraryFunction::timer("starttime", "_sysy_starttime"),
        LibraryFunction::timer("stoptime", "_sysy_stoptime"),
    ];
}

/// Names handled directly by the lowering instead of by a call.
pub const BUILTINS: &[&str] = &["vsum"];

pub fn find_library_function(name: &str) -> Option<&'static LibraryFunction> {
    RUNTIME_LIBRARY.iter().find(|function| function.name == name)
}

pub fn is_reserved_name(name: &str) -> bool {
    BUILTINS.contains(&name) || find_library_function(name).is_some()
}

/// Declares the runtime library in the module and registers each function
/// under its source name.
pub fn declare_runtime_library(compiler: &mut Compiler<'_>) -> Result<(), Error> {
    for library_function in RUNTIME_LIBRARY.iter() {
        let function_type = compiler.function_type(
            &library_function.return_type,
            &library_function.link_params(),
            library_function.variadic,
            0,
        )?;

        let function = compiler.module.add_function(
            library_function.symbol,
            function_type,
            Some(Linkage::External),
        );

        compiler.functions.insert(
            library_function.name.to_string(),
            FunctionSignature {
                function,
                return_type: library_function.return_type.clone(),
                params: library_function.params.clone(),
                variadic: library_function.variadic,
                line_argument: library_function.line_argument,
            },
        );
    }

    debug!(count = RUNTIME_LIBRARY.len(), "declared runtime library");
    Ok(())
}
