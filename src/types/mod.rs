//! Semantic types and compile-time constant evaluation.
//!
//! Resolves source type nodes into semantic types, evaluating array
//! dimensions and vector lengths through the constant evaluator. The scalar
//! constant arithmetic here is shared by the optimizer and by global
//! initializer lowering, so both agree on what a folded value is.

pub mod const_eval;
pub mod types;

#[cfg(test)]
mod tests;
