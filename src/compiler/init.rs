//! Brace initializer expansion.
//!
//! Maps a possibly nested initializer list onto the row-major slots of an
//! aggregate. A nested list fills exactly one element of the dimension it
//! appears in; a bare expression starts filling the element flatly from the
//! remaining items of the enclosing list.

use crate::ast::{ast::Initializer, expressions::Expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// A brace list where a single scalar is expected.
    NestedScalar,
    /// More items than the target has room for.
    Excess,
}

/// Flattens `items` for an aggregate of shape `dims`, outermost first.
///
/// Returns one entry per scalar slot; `None` marks slots left to zero.
pub fn flatten_initializer<'e>(
    dims: &[usize],
    items: &'e [Initializer],
) -> Result<Vec<Option<&'e Expr>>, InitError> {
    let mut slots = vec![None; dims.iter().product()];
    let mut cursor = 0;

    fill(dims, items, &mut cursor, &mut slots)?;

    if cursor < items.len() {
        return Err(InitError::Excess);
    }
    Ok(slots)
}

fn fill<'e>(
    dims: &[usize],
    items: &'e [Initializer],
    cursor: &mut usize,
    slots: &mut [Option<&'e Expr>],
) -> Result<(), InitError> {
    let Some((&length, inner_dims)) = dims.split_first() else {
        return Ok(());
    };
    let stride: usize = inner_dims.iter().product();

    for element in 0..length {
        let Some(item) = items.get(*cursor) else {
            break;
        };
        let element_slots = &mut slots[element * stride..(element + 1) * stride];

        match item {
            Initializer::Expr(expr) if inner_dims.is_empty() => {
                element_slots[0] = Some(expr);
                *cursor += 1;
            }
            Initializer::List(_) if inner_dims.is_empty() => return Err(InitError::NestedScalar),
            Initializer::List(nested) => {
                let mut nested_cursor = 0;
                fill(inner_dims, nested, &mut nested_cursor, element_slots)?;
                if nested_cursor < nested.len() {
                    return Err(InitError::Excess);
                }
                *cursor += 1;
            }
            Initializer::Expr(_) => fill(inner_dims, items, cursor, element_slots)?,
        }
    }
    Ok(())
}

/// Splits a row-major slot number back into one index per dimension.
pub fn unflatten_index(dims: &[usize], mut flat: usize) -> Vec<usize> {
    let mut indices = vec![0; dims.len()];
    for (index, &length) in indices.iter_mut().zip(dims).rev() {
        if length == 0 {
            continue;
        }
        *index = flat % length;
        flat /= length;
    }
    indices
}
