//! Compilation settings handed in by the driver.

use std::rc::Rc;

use inkwell::OptimizationLevel;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
}

impl OptLevel {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(OptLevel::O0),
            1 => Some(OptLevel::O1),
            2 => Some(OptLevel::O2),
            3 => Some(OptLevel::O3),
            _ => None,
        }
    }

    /// Upper bound on constant-folding passes at this level.
    pub fn max_fold_passes(self) -> usize {
        match self {
            OptLevel::O0 => 1,
            OptLevel::O1 => 4,
            OptLevel::O2 | OptLevel::O3 => 8,
        }
    }

    pub fn to_llvm(self) -> OptimizationLevel {
        match self {
            OptLevel::O0 => OptimizationLevel::None,
            OptLevel::O1 => OptimizationLevel::Less,
            OptLevel::O2 => OptimizationLevel::Default,
            OptLevel::O3 => OptimizationLevel::Aggressive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Source file name, used for the module name and error positions.
    pub file_name: String,
    pub optimization_level: OptLevel,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            file_name: String::from("main.sy"),
            optimization_level: OptLevel::default(),
        }
    }
}

impl CompileOptions {
    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    /// Sets the level from its numeric form, rejecting anything above 3.
    pub fn with_opt_level(mut self, level: u8) -> Result<Self, Error> {
        self.optimization_level = OptLevel::from_level(level).ok_or_else(|| {
            Error::new(
                ErrorImpl::InvalidOptimizationLevel { level },
                Position(0, Rc::new(self.file_name.clone())),
            )
        })?;
        Ok(self)
    }

    pub fn max_fold_passes(&self) -> usize {
        self.optimization_level.max_fold_passes()
    }

    pub fn llvm_optimization_level(&self) -> OptimizationLevel {
        self.optimization_level.to_llvm()
    }
}
