use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};

use crate::{
    ast::expressions::Expr,
    errors::errors::{Error, ErrorImpl},
    types::types::{ScalarKind, Type},
};

use super::{
    compiler::{Compiler, FunctionSignature},
    expr::{convert_scalar, gen_expression},
    lvalue::gen_lval_address,
    value::{IrResult, TypedValue},
};

/// Generates a call to a user function, a runtime function or a builtin.
pub fn gen_call<'a>(
    compiler: &Compiler<'a>,
    name: &str,
    args: &[Expr],
    line: u32,
) -> Result<TypedValue<'a>, Error> {
    if name == "vsum" {
        return gen_vsum(compiler, args, line);
    }

    let signature = compiler.functions.get(name).cloned().ok_or_else(|| {
        compiler.error(
            ErrorImpl::FunctionNotDeclared {
                function: name.to_string(),
            },
            line,
        )
    })?;

    check_arity(compiler, &signature, args.len(), line)?;

    if name == "putf" && !matches!(args.first(), Some(Expr::StringLit { .. })) {
        return Err(compiler.error(
            ErrorImpl::ArgumentTypeMatchError {
                expected: String::from("string literal"),
                received: String::from("expression"),
            },
            line,
        ));
    }

    let mut arguments: Vec<BasicMetadataValueEnum<'a>> = vec![];
    if signature.line_argument {
        arguments.push(
            compiler
                .context
                .i32_type()
                .const_int(line as u64, false)
                .into(),
        );
    }

    for (index, arg) in args.iter().enumerate() {
        let value = match signature.params.get(index) {
            Some(param) => gen_argument(compiler, arg, param)?,
            None => gen_variadic_argument(compiler, arg)?,
        };
        arguments.push(value.into());
    }

    let call = compiler
        .builder
        .build_call(
            signature.function,
            &arguments,
            if signature.return_type == Type::Void {
                ""
            } else {
                "call"
            },
        )
        .at_line(&compiler.file_name, line)?;

    match call.try_as_basic_value().left() {
        Some(value) => Ok(TypedValue {
            value,
            ty: signature.return_type,
        }),
        // Void calls only appear as expression statements, which discard this.
        None => Ok(TypedValue::new(
            compiler.context.i32_type().const_zero(),
            Type::Void,
        )),
    }
}

fn check_arity(
    compiler: &Compiler<'_>,
    signature: &FunctionSignature<'_>,
    received: usize,
    line: u32,
) -> Result<(), Error> {
    let expected = signature.params.len();

    if received < expected {
        return Err(compiler.error(ErrorImpl::MissingArguments { expected, received }, line));
    }
    if received > expected && !signature.variadic {
        return Err(compiler.error(
            ErrorImpl::UnexpectedArguments { expected, received },
            line,
        ));
    }
    Ok(())
}

fn argument_mismatch(compiler: &Compiler<'_>, expected: &Type, received: &Type, line: u32) -> Error {
    compiler.error(
        ErrorImpl::ArgumentTypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        line,
    )
}

/// Lowers one argument for a fixed parameter of type `param`.
fn gen_argument<'a>(
    compiler: &Compiler<'a>,
    arg: &Expr,
    param: &Type,
) -> Result<BasicValueEnum<'a>, Error> {
    let line = arg.line();

    if let Type::Pointer(_) = param {
        let Expr::LVal(lval) = arg else {
            let value = gen_expression(compiler, arg)?;
            return Err(argument_mismatch(compiler, param, &value.ty, line));
        };

        let address = gen_lval_address(compiler, lval)?;
        if address.ty != *param {
            return Err(argument_mismatch(compiler, param, &address.ty, line));
        }
        return Ok(address.value);
    }

    let value = gen_expression(compiler, arg)?;
    match param.scalar_kind() {
        Some(kind) if value.ty.is_scalar() => {
            Ok(convert_scalar(compiler, value, kind, line)?.value)
        }
        _ if value.ty == *param => Ok(value.value),
        _ => Err(argument_mismatch(compiler, param, &value.ty, line)),
    }
}

/// Variadic arguments follow C promotion: `float` widens to `double`.
fn gen_variadic_argument<'a>(
    compiler: &Compiler<'a>,
    arg: &Expr,
) -> Result<BasicValueEnum<'a>, Error> {
    let line = arg.line();
    let value = gen_expression(compiler, arg)?;

    match value.ty {
        Type::Int | Type::Str => Ok(value.value),
        Type::Float => Ok(compiler
            .builder
            .build_float_ext(
                value.value.into_float_value(),
                compiler.context.f64_type(),
                "fpext",
            )
            .at_line(&compiler.file_name, line)?
            .into()),
        other => Err(compiler.error(
            ErrorImpl::ArgumentTypeMatchError {
                expected: String::from("int, float or string"),
                received: other.to_string(),
            },
            line,
        )),
    }
}

/// `vsum(v)`: the sum of every lane, accumulated from zero in lane order.
fn gen_vsum<'a>(compiler: &Compiler<'a>, args: &[Expr], line: u32) -> Result<TypedValue<'a>, Error> {
    let [arg] = args else {
        let received = args.len();
        return Err(if received == 0 {
            compiler.error(
                ErrorImpl::MissingArguments {
                    expected: 1,
                    received,
                },
                line,
            )
        } else {
            compiler.error(
                ErrorImpl::UnexpectedArguments {
                    expected: 1,
                    received,
                },
                line,
            )
        });
    };

    let value = gen_expression(compiler, arg)?;
    let Type::Vector(kind, length) = value.ty else {
        return Err(compiler.error(
            ErrorImpl::InvalidVectorOperation {
                message: format!("`vsum` expects a vector, received `{}`", value.ty),
            },
            line,
        ));
    };

    let vector = value.value.into_vector_value();
    let builder = &compiler.builder;
    let i32_type = compiler.context.i32_type();

    let mut sum: BasicValueEnum<'a> = match kind {
        ScalarKind::Int => i32_type.const_zero().into(),
        ScalarKind::Float => compiler.context.f32_type().const_zero().into(),
    };

    for lane in 0..length {
        let element = builder
            .build_extract_element(vector, i32_type.const_int(lane as u64, false), "lane")
            .at_line(&compiler.file_name, line)?;

        sum = match kind {
            ScalarKind::Int => builder
                .build_int_add(sum.into_int_value(), element.into_int_value(), "vsum")
                .map(BasicValueEnum::from),
            ScalarKind::Float => builder
                .build_float_add(sum.into_float_value(), element.into_float_value(), "vsum")
                .map(BasicValueEnum::from),
        }
        .at_line(&compiler.file_name, line)?;
    }

    Ok(TypedValue {
        value: sum,
        ty: Type::scalar(kind),
    })
}
