//! Fixed-point driver for the tree optimizations.

use tracing::{debug, info};

use crate::ast::ast::CompUnit;

use super::constant_folding::ConstantFolder;

/// Outcome of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationReport {
    /// Passes actually run, at most the configured cap.
    pub passes: usize,
    /// Whether any pass rewrote the tree.
    pub changed: bool,
    /// Nodes replaced across all passes.
    pub rewrites: usize,
}

pub struct AstOptimizer {
    max_passes: usize,
}

impl AstOptimizer {
    pub fn new(max_passes: usize) -> Self {
        AstOptimizer { max_passes }
    }

    /// Folds `unit` until a pass changes nothing or the pass cap is hit.
    pub fn optimize(&self, unit: &mut CompUnit) -> OptimizationReport {
        let mut folder = ConstantFolder::new();
        let mut report = OptimizationReport {
            passes: 0,
            changed: false,
            rewrites: 0,
        };

        while report.passes < self.max_passes {
            report.passes += 1;
            let changed = folder.fold(unit);
            debug!(pass = report.passes, changed, "constant folding pass");

            if !changed {
                break;
            }
            report.changed = true;
        }

        report.rewrites = folder.rewrites();
        info!(
            passes = report.passes,
            rewrites = report.rewrites,
            "tree optimization finished"
        );
        report
    }
}
