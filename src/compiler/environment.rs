//! Lexical scopes and the symbols bound in them.

use std::collections::HashMap;

use inkwell::values::{FunctionValue, GlobalValue, PointerValue};

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::{
        const_eval::{ConstBinding, ConstValue, ConstantLookup},
        types::Type,
    },
    Position,
};

/// Where a symbol lives.
#[derive(Debug, Clone, Copy)]
pub enum Storage<'a> {
    Global(GlobalValue<'a>),
    Local(PointerValue<'a>),
}

impl<'a> Storage<'a> {
    pub fn pointer(&self) -> PointerValue<'a> {
        match self {
            Storage::Global(global) => global.as_pointer_value(),
            Storage::Local(pointer) => *pointer,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Storage::Global(_))
    }
}

/// The base pointer of an array parameter, loaded once in the entry block of
/// `function` and only valid inside it.
#[derive(Debug, Clone, Copy)]
pub struct ParamBase<'a> {
    pub pointer: PointerValue<'a>,
    pub function: FunctionValue<'a>,
}

#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub storage: Storage<'a>,
    /// Declared type. Array parameters are `Pointer(element)`.
    pub ty: Type,
    pub is_const: bool,
    pub is_array: bool,
    /// Value of a scalar constant initialized with a constant expression.
    pub const_value: Option<ConstValue>,
    pub param_base: Option<ParamBase<'a>>,
}

impl<'a> Symbol<'a> {
    pub fn variable(storage: Storage<'a>, ty: Type, is_const: bool) -> Self {
        Symbol {
            storage,
            is_array: ty.is_array(),
            ty,
            is_const,
            const_value: None,
            param_base: None,
        }
    }

    pub fn array_param(storage: Storage<'a>, ty: Type, base: ParamBase<'a>) -> Self {
        Symbol {
            storage,
            ty,
            is_const: false,
            is_array: true,
            const_value: None,
            param_base: Some(base),
        }
    }

    pub fn with_const_value(mut self, value: ConstValue) -> Self {
        self.const_value = Some(value);
        self
    }
}

#[derive(Debug)]
pub struct Scope<'a> {
    pub variable_lookup: HashMap<String, Symbol<'a>>,
    pub id: usize,
}

/// Stack of scopes, innermost last. The bottom scope holds globals.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    scopes: Vec<Scope<'a>>,
    next_id: usize,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Opens a scope and returns its id.
    pub fn enter_scope(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.scopes.push(Scope {
            variable_lookup: HashMap::new(),
            id,
        });
        id
    }

    pub fn leave_scope(&mut self, position: Position) -> Result<Scope<'a>, Error> {
        self.scopes
            .pop()
            .ok_or_else(|| Error::new(ErrorImpl::ScopeUnderflow, position))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_global_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Binds `name` in the innermost scope. Shadowing an outer binding is
    /// fine, rebinding within the same scope is not.
    pub fn declare(&mut self, name: &str, symbol: Symbol<'a>, position: Position) -> Result<(), Error> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(Error::new(ErrorImpl::ScopeUnderflow, position));
        };

        if scope.variable_lookup.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: name.to_string(),
                },
                position,
            ));
        }

        scope.variable_lookup.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol<'a>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variable_lookup.get(name))
    }
}

impl ConstantLookup for Environment<'_> {
    fn lookup_constant(&self, name: &str) -> ConstBinding {
        match self.lookup(name) {
            Some(symbol) if symbol.is_const && symbol.storage.is_global() => symbol
                .const_value
                .map_or(ConstBinding::NotConstant, ConstBinding::Value),
            Some(_) => ConstBinding::NotConstant,
            None => ConstBinding::Undefined,
        }
    }
}
