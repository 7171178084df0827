//! Tree-level optimizations run before lowering.
//!
//! Currently a single constant-folding pass, driven to a fixed point by
//! [`optimizer::AstOptimizer`] under a pass cap.

pub mod constant_folding;
pub mod optimizer;

#[cfg(test)]
mod tests;
