/// AST (Abstract Syntax Tree) module
/// Contains the program tree handed over by the front end
///
/// Submodules:
/// - ast: Compilation unit, declarations, initializers and functions
/// - expressions: Expression nodes and lvalues
/// - statements: Statement nodes and blocks
/// - types: Type nodes as written in the source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
