//! Main compiler module.
//!
//! This module contains the core Compiler structure and implements the lowering
//! pipeline from the program tree to LLVM IR. It manages the LLVM context, module
//! creation, type conversion, scopes and per-function state.

use std::{collections::HashMap, rc::Rc};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::{BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace,
};
use tracing::{debug, info, trace};

use crate::{
    ast::{
        ast::{CompUnit, Function, Param},
        types::TypeNode,
    },
    errors::errors::{Error, ErrorImpl},
    optimizer::optimizer::AstOptimizer,
    types::{
        const_eval::{ConstEvaluator, SizeBound},
        types::{ScalarKind, Type},
    },
    Position,
};

use super::{
    decl::gen_decl,
    environment::{Environment, ParamBase, Storage, Symbol},
    options::CompileOptions,
    stdlib::{declare_runtime_library, is_reserved_name},
    stmt::gen_block,
    value::IrResult,
};

/// State of the function currently being lowered.
#[derive(Debug)]
pub struct FunctionContext<'a> {
    pub function: FunctionValue<'a>,
    pub return_type: Type,
    /// Innermost loop last.
    pub break_targets: Vec<BasicBlock<'a>>,
    pub continue_targets: Vec<BasicBlock<'a>>,
}

/// A callable function, user-defined or from the runtime library.
#[derive(Debug, Clone)]
pub struct FunctionSignature<'a> {
    pub function: FunctionValue<'a>,
    pub return_type: Type,
    pub params: Vec<Type>,
    pub variadic: bool,
    pub line_argument: bool,
}

/// The main compiler structure that holds the state of the lowering process.
///
/// This structure manages all aspects of LLVM code generation, including:
/// - The LLVM context, module, and builder
/// - The scope stack with every visible symbol
/// - The callable functions and the function being lowered
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    pub options: CompileOptions,
    /// Shared by every error position
    pub file_name: Rc<String>,

    /// Lexical scopes, globals at the bottom
    pub environment: Environment<'a>,
    /// Callable functions by source name
    pub functions: HashMap<String, FunctionSignature<'a>>,
    /// Set while a function body is lowered
    pub current_function: Option<FunctionContext<'a>>,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance.
    ///
    /// # Arguments
    ///
    /// * `options` - Compilation settings; the file name also names the module
    /// * `context` - Reference to the LLVM context
    ///
    /// # Returns
    ///
    /// A new Compiler instance with an empty module and no open scopes.
    pub fn new(options: CompileOptions, context: &'a Context) -> Self {
        Compiler {
            file_name: Rc::new(options.file_name.clone()),
            module: context.create_module(&options.file_name),
            builder: context.create_builder(),
            options,
            environment: Environment::new(),
            functions: HashMap::new(),
            current_function: None,
            context,
        }
    }

    pub fn position(&self, line: u32) -> Position {
        Position(line, Rc::clone(&self.file_name))
    }

    pub fn error(&self, error: ErrorImpl, line: u32) -> Error {
        Error::new(error, self.position(line))
    }

    /// Constant evaluator resolving names through the current scopes.
    pub fn evaluator(&self) -> ConstEvaluator<'_, Environment<'a>> {
        ConstEvaluator::new(&self.environment, Rc::clone(&self.file_name))
    }

    /// Returns the textual IR of the module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Converts a resolved type to an LLVM basic type.
    ///
    /// # Arguments
    ///
    /// * `type_` - The type to convert
    /// * `line` - Source line reported if the type has no value representation
    ///
    /// # Returns
    ///
    /// The corresponding LLVM BasicTypeEnum, or an error for `void`.
    pub fn convert_type(&self, type_: &Type, line: u32) -> Result<BasicTypeEnum<'a>, Error> {
        Ok(match type_ {
            Type::Int => self.context.i32_type().into(),
            Type::Float => self.context.f32_type().into(),
            Type::Vector(kind, length) => self.vector_type(*kind, *length).into(),
            Type::Array(element, length) => self
                .convert_type(element, line)?
                .array_type(*length as u32)
                .into(),
            Type::Pointer(pointee) => self
                .convert_type(pointee, line)?
                .ptr_type(AddressSpace::default())
                .into(),
            Type::Str => self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into(),
            Type::Void => {
                return Err(self.error(
                    ErrorImpl::TypeMatchError {
                        expected: String::from("a value type"),
                        received: type_.to_string(),
                    },
                    line,
                ))
            }
        })
    }

    pub fn vector_type(&self, kind: ScalarKind, length: usize) -> inkwell::types::VectorType<'a> {
        match kind {
            ScalarKind::Int => self.context.i32_type().vec_type(length as u32),
            ScalarKind::Float => self.context.f32_type().vec_type(length as u32),
        }
    }

    /// Builds an LLVM function type from a return type and parameter types.
    pub fn function_type(
        &self,
        return_type: &Type,
        params: &[Type],
        variadic: bool,
        line: u32,
    ) -> Result<FunctionType<'a>, Error> {
        let params = params
            .iter()
            .map(|param| self.convert_type(param, line).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match return_type {
            Type::Void => self.context.void_type().fn_type(&params, variadic),
            other => self.convert_type(other, line)?.fn_type(&params, variadic),
        })
    }

    /// The all-zero constant of a type.
    pub fn zero_value(&self, type_: &Type, line: u32) -> Result<BasicValueEnum<'a>, Error> {
        Ok(match type_ {
            Type::Int => self.context.i32_type().const_zero().into(),
            Type::Float => self.context.f32_type().const_zero().into(),
            Type::Vector(kind, length) => self.vector_type(*kind, *length).const_zero().into(),
            Type::Array(..) => self
                .convert_type(type_, line)?
                .into_array_type()
                .const_zero()
                .into(),
            _ => self
                .convert_type(type_, line)?
                .into_pointer_type()
                .const_null()
                .into(),
        })
    }

    fn undef_value(&self, type_: &Type, line: u32) -> Result<BasicValueEnum<'a>, Error> {
        Ok(match type_ {
            Type::Int => self.context.i32_type().get_undef().into(),
            Type::Float => self.context.f32_type().get_undef().into(),
            Type::Vector(kind, length) => self.vector_type(*kind, *length).get_undef().into(),
            Type::Array(..) => self
                .convert_type(type_, line)?
                .into_array_type()
                .get_undef()
                .into(),
            _ => self
                .convert_type(type_, line)?
                .into_pointer_type()
                .get_undef()
                .into(),
        })
    }

    /// Runs `body` inside a fresh scope, closing it on every exit path.
    pub fn with_scope<T>(
        &mut self,
        line: u32,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let outer_depth = self.environment.depth();
        let id = self.environment.enter_scope();
        trace!(scope = id, "enter scope");

        let result = body(self);
        let position = self.position(line);
        let left = self.environment.leave_scope(position);
        trace!(scope = id, "leave scope");
        debug_assert!(
            left.is_err() || self.environment.depth() == outer_depth,
            "scope stack unbalanced after scope {}",
            id
        );

        let value = result?;
        left?;
        Ok(value)
    }

    /// Runs `body` with `break_target` and `continue_target` as the innermost
    /// loop targets, popping them on every exit path.
    pub fn with_loop<T>(
        &mut self,
        break_target: BasicBlock<'a>,
        continue_target: BasicBlock<'a>,
        line: u32,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        match self.current_function.as_mut() {
            Some(function) => {
                function.break_targets.push(break_target);
                function.continue_targets.push(continue_target);
            }
            None => return Err(self.outside_function(line)),
        }

        let result = body(self);

        if let Some(function) = self.current_function.as_mut() {
            function.break_targets.pop();
            function.continue_targets.pop();
        }
        result
    }

    fn outside_function(&self, line: u32) -> Error {
        self.error(
            ErrorImpl::IrBuilderError {
                message: String::from("statement lowered outside of a function"),
            },
            line,
        )
    }

    pub fn function_context(&self, line: u32) -> Result<&FunctionContext<'a>, Error> {
        self.current_function
            .as_ref()
            .ok_or_else(|| self.outside_function(line))
    }

    pub fn current_function_value(&self, line: u32) -> Result<FunctionValue<'a>, Error> {
        Ok(self.function_context(line)?.function)
    }

    /// Appends a basic block to the current function.
    pub fn append_block(&self, name: &str, line: u32) -> Result<BasicBlock<'a>, Error> {
        let function = self.current_function_value(line)?;
        Ok(self.context.append_basic_block(function, name))
    }

    pub fn insert_block(&self, line: u32) -> Result<BasicBlock<'a>, Error> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| self.outside_function(line))
    }

    pub fn current_block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// Moves the builder to a fresh block if the current one already ends in
    /// a terminator, so code after `return`/`break`/`continue` stays valid.
    pub fn ensure_open_block(&self, line: u32) -> Result<(), Error> {
        if self.current_block_terminated() {
            let block = self.append_block("unreachable", line)?;
            self.builder.position_at_end(block);
        }
        Ok(())
    }

    /// Creates a stack slot in the entry block of the current function.
    pub fn create_entry_alloca(
        &self,
        type_: BasicTypeEnum<'a>,
        name: &str,
        line: u32,
    ) -> Result<PointerValue<'a>, Error> {
        let function = self.current_function_value(line)?;
        let entry = function
            .get_first_basic_block()
            .ok_or_else(|| self.outside_function(line))?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        builder
            .build_alloca(type_, name)
            .at_line(&self.file_name, line)
    }

    /// Lowers a whole compilation unit into the module.
    ///
    /// Declares the runtime library, lowers global declarations, checks the
    /// entry point, lowers every function and verifies the result.
    pub fn lower(&mut self, unit: &CompUnit) -> Result<(), Error> {
        self.environment.enter_scope();

        declare_runtime_library(self)?;

        for decl in unit.decls.iter() {
            gen_decl(self, decl)?;
        }

        self.check_entry_point(unit)?;

        for function in unit.functions.iter() {
            self.gen_function(function)?;
        }

        self.verify()?;

        let position = self.position(0);
        self.environment.leave_scope(position)?;
        Ok(())
    }

    fn check_entry_point(&self, unit: &CompUnit) -> Result<(), Error> {
        let mut found = false;

        for function in unit.functions.iter().filter(|function| function.name == "main") {
            if found {
                return Err(self.error(ErrorImpl::DuplicateMain, function.line));
            }
            if function.return_type != TypeNode::Int || !function.params.is_empty() {
                return Err(self.error(ErrorImpl::InvalidMainSignature, function.line));
            }
            found = true;
        }

        if !found {
            return Err(self.error(ErrorImpl::MissingMain, 0));
        }
        Ok(())
    }

    fn gen_function(&mut self, function: &Function) -> Result<(), Error> {
        let line = function.line;
        let name = function.name.as_str();

        if self.functions.contains_key(name)
            || is_reserved_name(name)
            || self.environment.lookup(name).is_some()
        {
            return Err(self.error(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: name.to_string(),
                },
                line,
            ));
        }

        let return_type = self.evaluator().resolve_type(&function.return_type)?;
        let params = function
            .params
            .iter()
            .map(|param| self.resolve_param_type(param))
            .collect::<Result<Vec<_>, _>>()?;

        let function_type = self.function_type(&return_type, &params, false, line)?;
        let linkage = if name == "main" {
            Linkage::External
        } else {
            Linkage::Internal
        };
        let function_value = self.module.add_function(name, function_type, Some(linkage));

        // Registered before the body so recursive calls resolve.
        self.functions.insert(
            name.to_string(),
            FunctionSignature {
                function: function_value,
                return_type: return_type.clone(),
                params: params.clone(),
                variadic: false,
                line_argument: false,
            },
        );

        debug!(function = name, params = params.len(), "lowering function");

        let entry = self.context.append_basic_block(function_value, "entry");
        self.builder.position_at_end(entry);
        self.current_function = Some(FunctionContext {
            function: function_value,
            return_type: return_type.clone(),
            break_targets: vec![],
            continue_targets: vec![],
        });

        let result = self.with_scope(line, |compiler| {
            compiler.bind_params(function, function_value, &params)?;
            gen_block(compiler, &function.body)?;
            compiler.finish_function(&return_type, line)
        });

        self.current_function = None;
        result
    }

    fn resolve_param_type(&self, param: &Param) -> Result<Type, Error> {
        let base = self.evaluator().resolve_type(&param.ty)?;

        if base == Type::Void {
            return Err(self.error(
                ErrorImpl::TypeMatchError {
                    expected: String::from("a parameter type"),
                    received: base.to_string(),
                },
                param.line,
            ));
        }

        if !param.is_array {
            return Ok(base);
        }

        if base.is_vector() {
            return Err(self.error(
                ErrorImpl::InvalidVectorOperation {
                    message: format!("parameter `{}` cannot be an array of vectors", param.name),
                },
                param.line,
            ));
        }

        let evaluator = self.evaluator();
        let dims = param
            .dims
            .iter()
            .map(|dim| evaluator.eval_size(dim, SizeBound::Positive))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Type::Pointer(Box::new(Type::with_dims(base, &dims))))
    }

    /// Spills every parameter to a stack slot and binds it. Array parameters
    /// also get their base pointer loaded once, here in the entry block.
    fn bind_params(
        &mut self,
        function: &Function,
        function_value: FunctionValue<'a>,
        params: &[Type],
    ) -> Result<(), Error> {
        for (index, (param, type_)) in function.params.iter().zip(params).enumerate() {
            let value = function_value
                .get_nth_param(index as u32)
                .ok_or_else(|| self.outside_function(param.line))?;

            let slot = self.create_entry_alloca(
                self.convert_type(type_, param.line)?,
                &param.name,
                param.line,
            )?;
            self.builder
                .build_store(slot, value)
                .at_line(&self.file_name, param.line)?;

            let symbol = if param.is_array {
                let pointer = self
                    .builder
                    .build_load(slot, &format!("{}_loaded", param.name))
                    .at_line(&self.file_name, param.line)?
                    .into_pointer_value();

                Symbol::array_param(
                    Storage::Local(slot),
                    type_.clone(),
                    ParamBase {
                        pointer,
                        function: function_value,
                    },
                )
            } else {
                Symbol::variable(Storage::Local(slot), type_.clone(), false)
            };

            let position = self.position(param.line);
            self.environment.declare(&param.name, symbol, position)?;
        }
        Ok(())
    }

    /// Terminates the last block of a function that falls off its end.
    fn finish_function(&self, return_type: &Type, line: u32) -> Result<(), Error> {
        if self.current_block_terminated() {
            return Ok(());
        }

        match return_type {
            Type::Void => self.builder.build_return(None),
            other => {
                let undef = self.undef_value(other, line)?;
                self.builder.build_return(Some(&undef))
            }
        }
        .at_line(&self.file_name, line)?;
        Ok(())
    }

    fn verify(&self) -> Result<(), Error> {
        self.module.verify().map_err(|message| {
            self.error(
                ErrorImpl::ModuleVerificationError {
                    message: message.to_string(),
                },
                0,
            )
        })
    }

    /// Stamps the host triple and data layout on the module, creating the
    /// target machine at the configured optimization level.
    pub fn configure_host_target(&self) -> Result<(), Error> {
        let target_error = |message: String| self.error(ErrorImpl::TargetError { message }, 0);

        Target::initialize_native(&InitializationConfig::default()).map_err(target_error)?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple)
            .map_err(|message| target_error(message.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                self.options.llvm_optimization_level(),
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| target_error(String::from("could not create a target machine")))?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());
        Ok(())
    }
}

/// The main compile function: folds the tree, then lowers it into a module.
///
/// This is the primary entry point for compilation. It:
/// 1. Runs the constant folder up to the pass cap of the optimization level
/// 2. Creates a new Compiler instance
/// 3. Lowers declarations and functions, then verifies the module
///
/// # Arguments
///
/// * `unit` - The program tree; folded in place
/// * `options` - Compilation settings
/// * `context` - Reference to the LLVM context
///
/// # Returns
///
/// Returns a Result containing the Compiler instance, whose module is ready
/// for the backend, or the first Error encountered.
pub fn compile<'a>(
    unit: &mut CompUnit,
    options: CompileOptions,
    context: &'a Context,
) -> Result<Compiler<'a>, Error> {
    info!(
        file = %options.file_name,
        level = ?options.optimization_level,
        "compiling unit"
    );

    AstOptimizer::new(options.max_fold_passes()).optimize(unit);

    let mut compiler = Compiler::new(options, context);
    compiler.lower(unit)?;

    info!(functions = unit.functions.len(), "lowering finished");
    Ok(compiler)
}
