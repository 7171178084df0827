//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that lowers the
//! program tree into LLVM IR. It handles:
//!
//! - Global and local declarations with their initializers
//! - Expressions, including vector arithmetic, broadcast and `vsum`
//! - Statements and structured control flow
//! - Scopes, symbols and the runtime library

pub mod call;
pub mod compiler;
pub mod decl;
pub mod environment;
pub mod expr;
pub mod init;
pub mod lvalue;
pub mod options;
pub mod stdlib;
pub mod stmt;
pub mod value;
