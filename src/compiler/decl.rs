use inkwell::{
    types::VectorType,
    values::{BasicValueEnum, PointerValue},
    AddressSpace,
};
use tracing::trace;

use crate::{
    ast::{
        ast::{Decl, Def, Initializer},
        expressions::Expr,
    },
    errors::errors::{Error, ErrorImpl},
    types::{
        const_eval::{ConstValue, SizeBound},
        types::{ScalarKind, Type},
    },
};

use super::{
    compiler::Compiler,
    environment::{Storage, Symbol},
    expr::{coerce_to, convert_scalar, gen_expression},
    init::{flatten_initializer, unflatten_index, InitError},
    stdlib::is_reserved_name,
    value::IrResult,
};

/// Lowers every definition of a declaration, as globals at module scope and
/// as stack slots inside a function.
pub fn gen_decl<'a>(compiler: &mut Compiler<'a>, decl: &Decl) -> Result<(), Error> {
    let base = compiler.evaluator().resolve_type(decl.ty())?;

    if base == Type::Void {
        return Err(compiler.error(
            ErrorImpl::TypeMatchError {
                expected: String::from("a variable type"),
                received: base.to_string(),
            },
            decl.line(),
        ));
    }

    for def in decl.defs() {
        gen_def(compiler, &base, decl.is_const(), def)?;
    }
    Ok(())
}

fn invalid_initializer(compiler: &Compiler<'_>, message: String, line: u32) -> Error {
    compiler.error(ErrorImpl::InvalidInitializer { message }, line)
}

fn flatten<'e>(
    compiler: &Compiler<'_>,
    def: &Def,
    dims: &[usize],
    items: &'e [Initializer],
) -> Result<Vec<Option<&'e Expr>>, Error> {
    flatten_initializer(dims, items).map_err(|error| {
        let message = match error {
            InitError::NestedScalar => {
                format!("too many braces around a scalar element of `{}`", def.name)
            }
            InitError::Excess => format!("too many elements in the initializer of `{}`", def.name),
        };
        invalid_initializer(compiler, message, def.line)
    })
}

fn gen_def<'a>(
    compiler: &mut Compiler<'a>,
    base: &Type,
    is_const: bool,
    def: &Def,
) -> Result<(), Error> {
    if !def.dims.is_empty() && base.is_vector() {
        return Err(compiler.error(
            ErrorImpl::InvalidVectorOperation {
                message: format!("`{}` cannot be an array of vectors", def.name),
            },
            def.line,
        ));
    }

    let evaluator = compiler.evaluator();
    let dims = def
        .dims
        .iter()
        .map(|dim| evaluator.eval_size(dim, SizeBound::NonNegative))
        .collect::<Result<Vec<_>, _>>()?;
    let ty = Type::with_dims(base.clone(), &dims);

    if is_const && def.init.is_none() {
        return Err(invalid_initializer(
            compiler,
            format!("constant `{}` must be initialized", def.name),
            def.line,
        ));
    }

    trace!(name = %def.name, ty = %ty, global = compiler.environment.is_global_scope(), "declare");

    let symbol = if compiler.environment.is_global_scope() {
        gen_global(compiler, &ty, &dims, is_const, def)?
    } else {
        gen_local(compiler, &ty, &dims, is_const, def)?
    };

    let position = compiler.position(def.line);
    compiler.environment.declare(&def.name, symbol, position)
}

fn const_scalar<'a>(compiler: &Compiler<'a>, value: ConstValue) -> BasicValueEnum<'a> {
    match value {
        ConstValue::Int(value) => compiler
            .context
            .i32_type()
            .const_int(value as u64, true)
            .into(),
        ConstValue::Float(value) => compiler
            .context
            .f32_type()
            .const_float(value as f64)
            .into(),
    }
}

/// Evaluates each supplied slot at compile time, zero elsewhere.
fn const_slots<'a>(
    compiler: &Compiler<'a>,
    slots: &[Option<&Expr>],
    kind: ScalarKind,
) -> Result<Vec<BasicValueEnum<'a>>, Error> {
    let evaluator = compiler.evaluator();
    slots
        .iter()
        .map(|slot| {
            let value = match slot {
                Some(expr) => evaluator.eval_scalar(expr)?.cast(kind),
                None => ConstValue::Int(0).cast(kind),
            };
            Ok(const_scalar(compiler, value))
        })
        .collect()
}

/// Builds the constant for an array of shape `ty` from its flat slots.
fn const_array<'a>(
    compiler: &Compiler<'a>,
    ty: &Type,
    values: &[BasicValueEnum<'a>],
    line: u32,
) -> Result<BasicValueEnum<'a>, Error> {
    let Type::Array(element, length) = ty else {
        return values.first().copied().ok_or_else(|| {
            invalid_initializer(compiler, String::from("missing element value"), line)
        });
    };

    let stride = element.flat_len();
    let parts = (0..*length)
        .map(|index| const_array(compiler, element, &values[index * stride..(index + 1) * stride], line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match element.as_ref() {
        Type::Int => {
            let parts = parts.iter().map(|part| part.into_int_value()).collect::<Vec<_>>();
            compiler.context.i32_type().const_array(&parts)
        }
        Type::Float => {
            let parts = parts
                .iter()
                .map(|part| part.into_float_value())
                .collect::<Vec<_>>();
            compiler.context.f32_type().const_array(&parts)
        }
        _ => {
            let parts = parts
                .iter()
                .map(|part| part.into_array_value())
                .collect::<Vec<_>>();
            compiler
                .convert_type(element, line)?
                .into_array_type()
                .const_array(&parts)
        }
    }
    .into())
}

fn gen_global<'a>(
    compiler: &Compiler<'a>,
    ty: &Type,
    dims: &[usize],
    is_const: bool,
    def: &Def,
) -> Result<Symbol<'a>, Error> {
    let line = def.line;

    if is_reserved_name(&def.name) || compiler.functions.contains_key(&def.name) {
        return Err(compiler.error(
            ErrorImpl::VariableAlreadyDeclared {
                variable: def.name.clone(),
            },
            line,
        ));
    }

    let mut const_value = None;
    let initializer = match (ty, &def.init) {
        (_, None) => compiler.zero_value(ty, line)?,
        (Type::Int | Type::Float, Some(Initializer::Expr(expr))) => {
            let kind = ty.scalar_kind().unwrap_or(ScalarKind::Int);
            let value = compiler.evaluator().eval_scalar(expr)?.cast(kind);
            const_value = Some(value);
            const_scalar(compiler, value)
        }
        (Type::Vector(kind, length), Some(Initializer::List(items))) => {
            let slots = flatten(compiler, def, &[*length], items)?;
            let lanes = const_slots(compiler, &slots, *kind)?;
            VectorType::const_vector(&lanes).into()
        }
        (Type::Vector(..), Some(Initializer::Expr(expr))) => {
            return Err(compiler.error(
                ErrorImpl::NonConstantExpression {
                    message: format!(
                        "global vector `{}` must be initialized with a brace list",
                        def.name
                    ),
                },
                expr.line(),
            ))
        }
        (Type::Array(..), Some(Initializer::List(items))) => {
            let slots = flatten(compiler, def, dims, items)?;
            if slots.iter().all(Option::is_none) {
                compiler.zero_value(ty, line)?
            } else {
                let kind = ty.base_element().scalar_kind().unwrap_or(ScalarKind::Int);
                let values = const_slots(compiler, &slots, kind)?;
                const_array(compiler, ty, &values, line)?
            }
        }
        (Type::Array(..), Some(Initializer::Expr(_))) => {
            return Err(invalid_initializer(
                compiler,
                format!("array `{}` needs a brace-enclosed initializer", def.name),
                line,
            ))
        }
        (_, Some(Initializer::List(_))) => {
            return Err(invalid_initializer(
                compiler,
                format!("scalar `{}` cannot take a brace list", def.name),
                line,
            ))
        }
        (other, Some(Initializer::Expr(_))) => {
            return Err(compiler.error(
                ErrorImpl::TypeMatchError {
                    expected: String::from("int, float, vector or array"),
                    received: other.to_string(),
                },
                line,
            ))
        }
    };

    let global = compiler.module.add_global(
        compiler.convert_type(ty, line)?,
        Some(AddressSpace::default()),
        &def.name,
    );
    global.set_initializer(&initializer);
    global.set_constant(is_const);

    let symbol = Symbol::variable(Storage::Global(global), ty.clone(), is_const);
    Ok(match const_value {
        Some(value) if is_const => symbol.with_const_value(value),
        _ => symbol,
    })
}

fn gen_local<'a>(
    compiler: &Compiler<'a>,
    ty: &Type,
    dims: &[usize],
    is_const: bool,
    def: &Def,
) -> Result<Symbol<'a>, Error> {
    let line = def.line;
    let llvm_type = compiler.convert_type(ty, line)?;
    let slot = compiler.create_entry_alloca(llvm_type, &def.name, line)?;

    match (ty, &def.init) {
        (_, None) => {}
        (Type::Array(..), Some(Initializer::List(items))) => {
            gen_local_array(compiler, slot, ty, dims, def, items)?;
        }
        (Type::Array(..), Some(Initializer::Expr(_))) => {
            return Err(invalid_initializer(
                compiler,
                format!("array `{}` needs a brace-enclosed initializer", def.name),
                line,
            ))
        }
        (Type::Vector(kind, length), Some(Initializer::List(items))) => {
            let slots = flatten(compiler, def, &[*length], items)?;

            let mut vector = compiler.vector_type(*kind, *length).const_zero();
            for (lane, slot) in slots.iter().enumerate() {
                let Some(expr) = slot else {
                    continue;
                };
                let value = gen_expression(compiler, expr)?;
                let value = convert_scalar(compiler, value, *kind, expr.line())?;
                let index = compiler.context.i32_type().const_int(lane as u64, false);
                vector = compiler
                    .builder
                    .build_insert_element(vector, value.value, index, "init")
                    .at_line(&compiler.file_name, line)?;
            }

            compiler
                .builder
                .build_store(slot, vector)
                .at_line(&compiler.file_name, line)?;
        }
        (_, Some(Initializer::List(_))) => {
            return Err(invalid_initializer(
                compiler,
                format!("scalar `{}` cannot take a brace list", def.name),
                line,
            ))
        }
        (_, Some(Initializer::Expr(expr))) => {
            let value = gen_expression(compiler, expr)?;
            let value = coerce_to(compiler, value, ty, expr.line())?;
            compiler
                .builder
                .build_store(slot, value.value)
                .at_line(&compiler.file_name, line)?;
        }
    }

    Ok(Symbol::variable(Storage::Local(slot), ty.clone(), is_const))
}

/// Zero-fills a local array, then stores every supplied element.
fn gen_local_array<'a>(
    compiler: &Compiler<'a>,
    slot: PointerValue<'a>,
    ty: &Type,
    dims: &[usize],
    def: &Def,
    items: &[Initializer],
) -> Result<(), Error> {
    let line = def.line;
    let slots = flatten(compiler, def, dims, items)?;

    let size = compiler
        .convert_type(ty, line)?
        .into_array_type()
        .size_of()
        .ok_or_else(|| invalid_initializer(compiler, format!("`{}` has no size", def.name), line))?;
    compiler
        .builder
        .build_memset(slot, 4, compiler.context.i8_type().const_zero(), size)
        .at_line(&compiler.file_name, line)?;

    let Some(kind) = ty.base_element().scalar_kind() else {
        return Err(compiler.error(
            ErrorImpl::TypeMatchError {
                expected: String::from("int or float elements"),
                received: ty.base_element().to_string(),
            },
            line,
        ));
    };
    let i32_type = compiler.context.i32_type();

    for (flat, slot_expr) in slots.iter().enumerate() {
        let Some(expr) = slot_expr else {
            continue;
        };

        let value = gen_expression(compiler, expr)?;
        let value = convert_scalar(compiler, value, kind, expr.line())?;

        let mut path = vec![i32_type.const_zero()];
        path.extend(
            unflatten_index(dims, flat)
                .into_iter()
                .map(|index| i32_type.const_int(index as u64, false)),
        );
        // Every path has one index per declared dimension.
        let element = unsafe { compiler.builder.build_gep(slot, &path, "init") }
            .at_line(&compiler.file_name, line)?;
        compiler
            .builder
            .build_store(element, value.value)
            .at_line(&compiler.file_name, line)?;
    }
    Ok(())
}
