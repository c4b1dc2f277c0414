/*
 * list_expansion.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! List expansion of template arguments.
//!
//! Parameters carrying an [`ExpansionModifier`] whose argument is a list are
//! expanded into several argument rows:
//!
//! - zip-family parameters are paired positionally
//! - cross parameters are combined by Cartesian product, row-major with the
//!   first parameter outermost
//! - when both appear, every zip row is crossed with every cross row, zip
//!   rows outermost
//!
//! Parameters without a modifier, and modifier parameters whose argument is
//! not a list, keep their whole value in every row.

use crate::error::ErrorKind;
use crate::template::{ExpansionModifier, Parameter};
use crate::term::Term;

/// Argument rows for one invocation. A single row means no list expansion.
pub fn expand_rows(
    template: &str,
    parameters: &[Parameter],
    values: Vec<Term>,
) -> Result<Vec<Vec<Term>>, ErrorKind> {
    let mut zipped = Vec::new();
    let mut crossed = Vec::new();
    for (index, (parameter, value)) in parameters.iter().zip(&values).enumerate() {
        let (Some(modifier), Term::List(_)) = (parameter.modifier, value) else {
            continue;
        };
        if modifier.is_zip() {
            zipped.push((index, modifier));
        } else {
            crossed.push(index);
        }
    }

    if zipped.is_empty() && crossed.is_empty() {
        return Ok(vec![values]);
    }

    let zip_rows = zip_rows(template, parameters, &values, &zipped)?;
    let cross_rows = cross_rows(&values, &crossed);

    let mut rows = Vec::with_capacity(zip_rows.len() * cross_rows.len());
    for zip_row in &zip_rows {
        for cross_row in &cross_rows {
            let mut row = values.clone();
            for (index, value) in zip_row.iter().chain(cross_row) {
                row[*index] = value.clone();
            }
            rows.push(row);
        }
    }
    Ok(rows)
}

fn list_at(values: &[Term], index: usize) -> &[Term] {
    values[index].as_list().unwrap_or(&[])
}

/// Positional rows over the zip group, as `(parameter index, element)` pairs.
fn zip_rows(
    template: &str,
    parameters: &[Parameter],
    values: &[Term],
    zipped: &[(usize, ExpansionModifier)],
) -> Result<Vec<Vec<(usize, Term)>>, ErrorKind> {
    if zipped.is_empty() {
        return Ok(vec![Vec::new()]);
    }

    let lengths: Vec<usize> = zipped
        .iter()
        .map(|(index, _)| list_at(values, *index).len())
        .collect();
    let shortest = lengths.iter().copied().min().unwrap_or(0);
    let longest = lengths.iter().copied().max().unwrap_or(0);

    let length = if shortest == longest {
        longest
    } else if zipped.iter().any(|(_, m)| *m == ExpansionModifier::Zip) {
        return Err(ErrorKind::ListLengthMismatch {
            template: template.to_string(),
            lengths: zipped
                .iter()
                .zip(&lengths)
                .map(|((index, _), len)| (parameters[*index].name.clone(), *len))
                .collect(),
        });
    } else if zipped.iter().any(|(_, m)| *m == ExpansionModifier::ZipMax) {
        longest
    } else {
        shortest
    };

    Ok((0..length)
        .map(|position| {
            zipped
                .iter()
                .map(|(index, _)| {
                    let element = list_at(values, *index)
                        .get(position)
                        .cloned()
                        .unwrap_or(Term::None);
                    (*index, element)
                })
                .collect()
        })
        .collect())
}

/// Cartesian rows over the cross group, first parameter outermost.
fn cross_rows(values: &[Term], crossed: &[usize]) -> Vec<Vec<(usize, Term)>> {
    let mut rows: Vec<Vec<(usize, Term)>> = vec![Vec::new()];
    for &index in crossed {
        let items = list_at(values, index);
        rows = rows
            .into_iter()
            .flat_map(|row| {
                items.iter().map(move |item| {
                    let mut next = row.clone();
                    next.push((index, item.clone()));
                    next
                })
            })
            .collect();
    }
    rows
}
