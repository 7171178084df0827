use inkwell::basic_block::BasicBlock;

use crate::{
    ast::{
        expressions::{Expr, LVal},
        statements::{Block, BlockItem, Stmt},
    },
    errors::errors::{Error, ErrorImpl},
    types::types::Type,
};

use super::{
    compiler::Compiler,
    decl::gen_decl,
    expr::{coerce_to, convert_scalar, gen_condition, gen_expression},
    lvalue::{resolve_place, Place},
    value::IrResult,
};

/// Lowers the items of a block in the current scope.
pub fn gen_block<'a>(compiler: &mut Compiler<'a>, block: &Block) -> Result<(), Error> {
    for item in block.items.iter() {
        match item {
            BlockItem::Decl(decl) => {
                compiler.ensure_open_block(decl.line())?;
                gen_decl(compiler, decl)?;
            }
            BlockItem::Stmt(stmt) => {
                compiler.ensure_open_block(stmt.line())?;
                gen_statement(compiler, stmt)?;
            }
        }
    }
    Ok(())
}

pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &Stmt) -> Result<(), Error> {
    match statement {
        Stmt::Assign {
            target,
            value,
            line,
        } => gen_assign(compiler, target, value, *line),
        Stmt::Expr { expr, .. } => {
            if let Some(expr) = expr {
                gen_expression(compiler, expr)?;
            }
            Ok(())
        }
        Stmt::Block(block) => compiler.with_scope(statement.line(), |compiler| {
            gen_block(compiler, block)
        }),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            line,
        } => gen_if(compiler, cond, then_branch, else_branch.as_deref(), *line),
        Stmt::While { cond, body, line } => gen_while(compiler, cond, body, *line),
        Stmt::Break { line } => {
            let target = compiler.function_context(*line)?.break_targets.last().copied();
            gen_jump(compiler, target, "break", *line)
        }
        Stmt::Continue { line } => {
            let target = compiler
                .function_context(*line)?
                .continue_targets
                .last()
                .copied();
            gen_jump(compiler, target, "continue", *line)
        }
        Stmt::Return { value, line } => gen_return(compiler, value.as_ref(), *line),
    }
}

fn gen_assign<'a>(
    compiler: &Compiler<'a>,
    target: &LVal,
    value: &Expr,
    line: u32,
) -> Result<(), Error> {
    let assign_to_array = || {
        compiler.error(
            ErrorImpl::AssignToArray {
                variable: target.name.clone(),
            },
            line,
        )
    };

    match compiler.environment.lookup(&target.name) {
        Some(symbol) if symbol.is_const => {
            return Err(compiler.error(
                ErrorImpl::AssignToConstant {
                    variable: target.name.clone(),
                },
                line,
            ))
        }
        Some(symbol) if symbol.is_array && target.indices.is_empty() => {
            return Err(assign_to_array())
        }
        _ => {}
    }

    match resolve_place(compiler, target)? {
        Place::VectorLane {
            vector,
            kind,
            index,
            ..
        } => {
            let lane = gen_expression(compiler, value)?;
            let lane = convert_scalar(compiler, lane, kind, line)?;

            let loaded = compiler
                .builder
                .build_load(vector, &target.name)
                .at_line(&compiler.file_name, line)?;
            let updated = compiler
                .builder
                .build_insert_element(loaded.into_vector_value(), lane.value, index, "insert")
                .at_line(&compiler.file_name, line)?;
            compiler
                .builder
                .build_store(vector, updated)
                .at_line(&compiler.file_name, line)?;
        }
        Place::Memory {
            ty: Type::Array(..),
            ..
        }
        | Place::Pointer { .. } => return Err(assign_to_array()),
        Place::Memory { pointer, ty } => {
            let value = gen_expression(compiler, value)?;
            let value = coerce_to(compiler, value, &ty, line)?;
            compiler
                .builder
                .build_store(pointer, value.value)
                .at_line(&compiler.file_name, line)?;
        }
    }
    Ok(())
}

fn gen_if<'a>(
    compiler: &mut Compiler<'a>,
    cond: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
    line: u32,
) -> Result<(), Error> {
    let condition = gen_condition(compiler, cond)?;

    let then_block = compiler.append_block("if.then", line)?;
    let else_block = else_branch
        .map(|_| compiler.append_block("if.else", line))
        .transpose()?;
    let end_block = compiler.append_block("if.end", line)?;

    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block.unwrap_or(end_block))
        .at_line(&compiler.file_name, line)?;

    compiler.builder.position_at_end(then_block);
    gen_statement(compiler, then_branch)?;
    branch_if_open(compiler, end_block, line)?;

    if let (Some(else_branch), Some(else_block)) = (else_branch, else_block) {
        compiler.builder.position_at_end(else_block);
        gen_statement(compiler, else_branch)?;
        branch_if_open(compiler, end_block, line)?;
    }

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_while<'a>(
    compiler: &mut Compiler<'a>,
    cond: &Expr,
    body: &Stmt,
    line: u32,
) -> Result<(), Error> {
    let cond_block = compiler.append_block("while.cond", line)?;
    let body_block = compiler.append_block("while.body", line)?;
    let end_block = compiler.append_block("while.end", line)?;

    compiler
        .builder
        .build_unconditional_branch(cond_block)
        .at_line(&compiler.file_name, line)?;

    compiler.builder.position_at_end(cond_block);
    let condition = gen_condition(compiler, cond)?;
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)
        .at_line(&compiler.file_name, line)?;

    compiler.builder.position_at_end(body_block);
    compiler.with_loop(end_block, cond_block, line, |compiler| {
        gen_statement(compiler, body)
    })?;
    branch_if_open(compiler, cond_block, line)?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn branch_if_open<'a>(
    compiler: &Compiler<'a>,
    target: BasicBlock<'a>,
    line: u32,
) -> Result<(), Error> {
    if !compiler.current_block_terminated() {
        compiler
            .builder
            .build_unconditional_branch(target)
            .at_line(&compiler.file_name, line)?;
    }
    Ok(())
}

fn gen_jump<'a>(
    compiler: &Compiler<'a>,
    target: Option<BasicBlock<'a>>,
    statement: &str,
    line: u32,
) -> Result<(), Error> {
    let Some(target) = target else {
        return Err(compiler.error(
            ErrorImpl::ControlFlowOutsideLoop {
                statement: statement.to_string(),
            },
            line,
        ));
    };

    compiler
        .builder
        .build_unconditional_branch(target)
        .at_line(&compiler.file_name, line)?;
    Ok(())
}

fn gen_return<'a>(compiler: &Compiler<'a>, value: Option<&Expr>, line: u32) -> Result<(), Error> {
    let return_type = compiler.function_context(line)?.return_type.clone();

    match (value, &return_type) {
        (Some(_), Type::Void) => Err(compiler.error(
            ErrorImpl::InvalidReturn {
                message: String::from("a void function cannot return a value"),
            },
            line,
        )),
        (None, Type::Void) => {
            compiler
                .builder
                .build_return(None)
                .at_line(&compiler.file_name, line)?;
            Ok(())
        }
        (None, other) => Err(compiler.error(
            ErrorImpl::InvalidReturn {
                message: format!("a function returning `{}` must return a value", other),
            },
            line,
        )),
        (Some(expr), other) => {
            let value = gen_expression(compiler, expr)?;
            let value = coerce_to(compiler, value, other, line)?;
            compiler
                .builder
                .build_return(Some(&value.value))
                .at_line(&compiler.file_name, line)?;
            Ok(())
        }
    }
}
