//! Resolution of named storage locations.
//!
//! Every read, write and address-of goes through [`resolve_place`], which
//! turns a name and its indices into one of three shapes: memory holding a
//! value of a known type, a single lane of a vector, or the base pointer of
//! an array parameter that was not indexed.

use inkwell::values::{IntValue, PointerValue};

use crate::{
    ast::expressions::LVal,
    errors::errors::{Error, ErrorImpl},
    types::types::{ScalarKind, Type},
};

use super::{
    compiler::Compiler,
    environment::Symbol,
    expr::gen_expression,
    value::{IrResult, TypedValue},
};

#[derive(Debug, Clone)]
pub enum Place<'a> {
    /// `pointer` addresses a value of type `ty`, possibly an array.
    Memory { pointer: PointerValue<'a>, ty: Type },
    /// Lane `index` of the vector of type `ty` stored at `vector`.
    VectorLane {
        vector: PointerValue<'a>,
        ty: Type,
        kind: ScalarKind,
        index: IntValue<'a>,
    },
    /// An unindexed array parameter: already a pointer to `pointee`.
    Pointer {
        pointer: PointerValue<'a>,
        pointee: Type,
    },
}

fn lookup_symbol<'a>(compiler: &Compiler<'a>, lval: &LVal) -> Result<Symbol<'a>, Error> {
    compiler
        .environment
        .lookup(&lval.name)
        .cloned()
        .ok_or_else(|| {
            compiler.error(
                ErrorImpl::VariableNotDeclared {
                    variable: lval.name.clone(),
                },
                lval.line,
            )
        })
}

fn gen_indices<'a>(compiler: &Compiler<'a>, lval: &LVal) -> Result<Vec<IntValue<'a>>, Error> {
    lval.indices
        .iter()
        .map(|index| {
            let value = gen_expression(compiler, index)?;
            match value.ty {
                Type::Int => Ok(value.value.into_int_value()),
                other => Err(compiler.error(
                    ErrorImpl::TypeMatchError {
                        expected: String::from("int"),
                        received: other.to_string(),
                    },
                    index.line(),
                )),
            }
        })
        .collect()
}

fn too_many_indices(compiler: &Compiler<'_>, lval: &LVal, dimensions: usize) -> Error {
    compiler.error(
        ErrorImpl::IndexOutOfDimensions {
            variable: lval.name.clone(),
            dimensions,
            received: lval.indices.len(),
        },
        lval.line,
    )
}

fn gep<'a>(
    compiler: &Compiler<'a>,
    pointer: PointerValue<'a>,
    indices: &[IntValue<'a>],
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    // Index counts are checked against the declared dimensions by the caller.
    unsafe { compiler.builder.build_gep(pointer, indices, "idx") }.at_line(&compiler.file_name, line)
}

/// Resolves an lvalue to the storage it denotes.
pub fn resolve_place<'a>(compiler: &Compiler<'a>, lval: &LVal) -> Result<Place<'a>, Error> {
    let symbol = lookup_symbol(compiler, lval)?;
    let indices = gen_indices(compiler, lval)?;
    let zero = compiler.context.i32_type().const_zero();

    if let Some(base) = symbol.param_base {
        if base.function != compiler.current_function_value(lval.line)? {
            return Err(compiler.error(
                ErrorImpl::StaleParameterPointer {
                    variable: lval.name.clone(),
                },
                lval.line,
            ));
        }

        let Type::Pointer(element) = &symbol.ty else {
            return Err(compiler.error(
                ErrorImpl::TypeMatchError {
                    expected: String::from("array parameter"),
                    received: symbol.ty.to_string(),
                },
                lval.line,
            ));
        };

        let dimensions = element.array_dims().len() + 1;
        if indices.len() > dimensions {
            return Err(too_many_indices(compiler, lval, dimensions));
        }
        if indices.is_empty() {
            return Ok(Place::Pointer {
                pointer: base.pointer,
                pointee: (**element).clone(),
            });
        }

        let pointer = gep(compiler, base.pointer, &indices, lval.line)?;
        let ty = element
            .peel(indices.len() - 1)
            .cloned()
            .ok_or_else(|| too_many_indices(compiler, lval, dimensions))?;
        return Ok(Place::Memory { pointer, ty });
    }

    let pointer = symbol.storage.pointer();

    match symbol.ty {
        Type::Vector(kind, _) if !indices.is_empty() => {
            if indices.len() != 1 {
                return Err(compiler.error(
                    ErrorImpl::InvalidVectorIndex {
                        variable: lval.name.clone(),
                    },
                    lval.line,
                ));
            }
            Ok(Place::VectorLane {
                vector: pointer,
                ty: symbol.ty.clone(),
                kind,
                index: indices[0],
            })
        }
        Type::Array(..) => {
            let dimensions = symbol.ty.array_dims().len();
            if indices.len() > dimensions {
                return Err(too_many_indices(compiler, lval, dimensions));
            }
            if indices.is_empty() {
                return Ok(Place::Memory {
                    pointer,
                    ty: symbol.ty,
                });
            }

            let mut path = vec![zero];
            path.extend(indices.iter().copied());
            let element_pointer = gep(compiler, pointer, &path, lval.line)?;
            let ty = symbol
                .ty
                .peel(indices.len())
                .cloned()
                .ok_or_else(|| too_many_indices(compiler, lval, dimensions))?;
            Ok(Place::Memory {
                pointer: element_pointer,
                ty,
            })
        }
        ty => {
            if !indices.is_empty() {
                return Err(too_many_indices(compiler, lval, 0));
            }
            Ok(Place::Memory { pointer, ty })
        }
    }
}

/// Decays an array in memory to a pointer to its first element.
fn decay<'a>(
    compiler: &Compiler<'a>,
    pointer: PointerValue<'a>,
    element: Type,
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    let zero = compiler.context.i32_type().const_zero();
    let first = gep(compiler, pointer, &[zero, zero], line)?;
    Ok(TypedValue::new(first, Type::Pointer(Box::new(element))))
}

/// Reads an lvalue. Arrays decay to a pointer to their first element.
pub fn gen_lval_value<'a>(compiler: &Compiler<'a>, lval: &LVal) -> Result<TypedValue<'a>, Error> {
    match resolve_place(compiler, lval)? {
        Place::Pointer { pointer, pointee } => {
            Ok(TypedValue::new(pointer, Type::Pointer(Box::new(pointee))))
        }
        Place::Memory {
            pointer,
            ty: Type::Array(element, _),
        } => decay(compiler, pointer, *element, lval.line),
        Place::Memory { pointer, ty } => {
            let value = compiler
                .builder
                .build_load(pointer, &lval.name)
                .at_line(&compiler.file_name, lval.line)?;
            Ok(TypedValue { value, ty })
        }
        Place::VectorLane {
            vector,
            kind,
            index,
            ..
        } => {
            let loaded = compiler
                .builder
                .build_load(vector, &lval.name)
                .at_line(&compiler.file_name, lval.line)?;
            let lane = compiler
                .builder
                .build_extract_element(loaded.into_vector_value(), index, "lane")
                .at_line(&compiler.file_name, lval.line)?;
            Ok(TypedValue::new(lane, Type::scalar(kind)))
        }
    }
}

/// Takes the address of an lvalue for a pointer parameter.
pub fn gen_lval_address<'a>(
    compiler: &Compiler<'a>,
    lval: &LVal,
) -> Result<TypedValue<'a>, Error> {
    match resolve_place(compiler, lval)? {
        Place::Pointer { pointer, pointee } => {
            Ok(TypedValue::new(pointer, Type::Pointer(Box::new(pointee))))
        }
        Place::Memory {
            pointer,
            ty: Type::Array(element, _),
        } => decay(compiler, pointer, *element, lval.line),
        Place::Memory { pointer, ty } => Ok(TypedValue::new(pointer, Type::Pointer(Box::new(ty)))),
        Place::VectorLane { .. } => Err(compiler.error(
            ErrorImpl::InvalidVectorOperation {
                message: format!("a lane of `{}` has no address", lval.name),
            },
            lval.line,
        )),
    }
}
