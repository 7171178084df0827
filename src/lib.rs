#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod optimizer;
pub mod types;

/// A source line paired with the name of the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

/// Renders an error the way the command line reports it.
///
/// ```text
/// Error: VariableNotDeclared (Variable `x` not declared)
/// -> main.sy:20
/// ```
pub fn format_error(error: &Error) -> String {
    let position = error.get_position();

    let header = if let ErrorTip::None = error.get_tip() {
        format!("Error: {}", error.get_error_name())
    } else {
        format!("Error: {} ({})", error.get_error_name(), error.get_tip())
    };

    format!("{}\n-> {}:{}", header, position.1, position.0)
}
