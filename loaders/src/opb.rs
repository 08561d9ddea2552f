//! OPB / PB-competition pseudo-boolean format loader.
//!
//! Supports the comment-carried metadata header (`#variable=`,
//! `#constraint=`, ...), an optional `soft: <top>` line, a `min:`/`max:`
//! objective, and hard/soft constraints of the form
//! `[weight] term+ (<= | = | >=) rhs ;` where each term is
//! `±coeff <literal-product>` and a literal is `x_i` or `~x_i`. Literal
//! products are expanded into auxiliary AND variables, exactly as product
//! terms in the competition format are required to be linearised.

use std::path::Path;

use problemo::Problem;
use problemo::common::IntoCommonProblem;

use crate::model::{RawBound, RawConstraint, RawModel, RawSense};

pub fn parse(path: impl AsRef<Path>) -> Result<RawModel, Problem> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| format!("failed to read OPB file: {e}").gloss())?;
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Result<RawModel, Problem> {
    let mut model = RawModel::default();
    model.minimize = true;

    let mut aux_counter: u64 = 0;
    let mut next_aux = |model: &mut RawModel| -> String {
        aux_counter += 1;
        let name = format!("__and_aux_{aux_counter}");
        model.ensure_variable(&name);
        name
    };

    // Re-join statements so that a `;`-terminated clause spanning multiple
    // physical lines is handled uniformly; comment lines are preserved only
    // for the `soft:` / metadata sniff below.
    let mut body = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('*') {
            if let Some(rest) = trimmed.strip_prefix("* soft:") {
                model.soft_top_cost = rest.trim().parse().ok();
            }
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("soft:") {
            let top = rest.trim().trim_end_matches(';').trim();
            model.soft_top_cost = top.parse().ok();
            continue;
        }
        body.push_str(trimmed);
        body.push(' ');
    }

    for clause in body.split(';') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        if let Some(rest) = clause.strip_prefix("min:") {
            model.minimize = true;
            parse_objective(rest, &mut model, &mut next_aux)?;
            continue;
        }
        if let Some(rest) = clause.strip_prefix("max:") {
            model.minimize = false;
            parse_objective(rest, &mut model, &mut next_aux)?;
            continue;
        }
        parse_constraint(clause, &mut model, &mut next_aux)?;
    }

    Ok(model)
}

/// Tokenised term: an optional leading weight (for soft constraints), a
/// signed coefficient and the list of literals in its product.
struct Term {
    coeff: f64,
    literals: Vec<(String, bool)>, // (variable, is_negated)
}

fn tokenize_terms(text: &str) -> Result<Vec<Term>, Problem> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut terms = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let coeff_tok = tokens[i];
        let coeff: f64 = coeff_tok
            .parse()
            .map_err(|_| format!("expected a signed coefficient, found '{coeff_tok}'").gloss())?;
        i += 1;
        let mut literals = Vec::new();
        while i < tokens.len() && is_literal(tokens[i]) {
            let (name, negated) = split_literal(tokens[i]);
            literals.push((name, negated));
            i += 1;
        }
        if literals.is_empty() {
            return Err(format!("term with coefficient {coeff} has no literal").gloss());
        }
        terms.push(Term { coeff, literals });
    }
    Ok(terms)
}

fn is_literal(tok: &str) -> bool {
    tok.starts_with('x') || tok.starts_with("~x")
}

fn split_literal(tok: &str) -> (String, bool) {
    if let Some(rest) = tok.strip_prefix('~') {
        (rest.to_string(), true)
    } else {
        (tok.to_string(), false)
    }
}

/// Expands a term's literal product into a single `(variable, coefficient)`
/// pair, introducing an AND auxiliary variable and its defining constraints
/// when the product has more than one literal. Returns the linear
/// contribution `(var, coeff)` plus a constant to add to the row's rhs.
fn linearise_term(
    term: &Term,
    model: &mut RawModel,
    next_aux: &mut impl FnMut(&mut RawModel) -> String,
) -> (String, f64, f64) {
    if term.literals.len() == 1 {
        let (name, negated) = &term.literals[0];
        model.ensure_variable(name);
        if *negated {
            // coeff * (1 - x) = coeff - coeff * x
            return (name.clone(), -term.coeff, term.coeff);
        }
        return (name.clone(), term.coeff, 0.0);
    }

    let aux = next_aux(model);
    model.bounds.insert(aux.clone(), RawBound { lower: 0, upper: 1 });
    model.integer_variables.insert(aux.clone());

    let mut literal_coeffs: Vec<(String, f64)> = Vec::new();
    let mut constant = 0.0;
    for (name, negated) in &term.literals {
        model.ensure_variable(name);
        if *negated {
            literal_coeffs.push((name.clone(), -1.0));
            constant += 1.0;
        } else {
            literal_coeffs.push((name.clone(), 1.0));
        }
    }
    let k = literal_coeffs.len() as f64;

    // z <= each literal: literal - z >= 0
    for (name, coeff) in &literal_coeffs {
        model.constraints.push(RawConstraint {
            name: format!("{aux}_le_{name}"),
            coefficients: vec![(name.clone(), *coeff), (aux.clone(), -1.0)],
            sense: RawSense::Ge,
            rhs: -constant_for_literal(*coeff),
            weight: None,
        });
    }
    // z >= sum(literals) - (k - 1)
    let mut ge_coeffs = literal_coeffs.clone();
    ge_coeffs.push((aux.clone(), -1.0));
    model.constraints.push(RawConstraint {
        name: format!("{aux}_and"),
        coefficients: ge_coeffs,
        sense: RawSense::Ge,
        rhs: (k - 1.0) - constant,
        weight: None,
    });

    (aux, term.coeff, 0.0)
}

fn constant_for_literal(coeff: f64) -> f64 {
    if coeff < 0.0 { 1.0 } else { 0.0 }
}

fn parse_objective(
    text: &str,
    model: &mut RawModel,
    next_aux: &mut impl FnMut(&mut RawModel) -> String,
) -> Result<(), Problem> {
    let terms = tokenize_terms(text)?;
    for term in &terms {
        let (var, coeff, constant) = linearise_term(term, model, next_aux);
        model.objective.push((var, coeff));
        model.objective_constant += constant;
    }
    Ok(())
}

fn parse_constraint(
    clause: &str,
    model: &mut RawModel,
    next_aux: &mut impl FnMut(&mut RawModel) -> String,
) -> Result<(), Problem> {
    let (weight, rest) = if let Some(stripped) = clause.strip_prefix('[') {
        let end = stripped
            .find(']')
            .ok_or_else(|| "unterminated soft-constraint weight".to_string().gloss())?;
        let weight: f64 = stripped[..end]
            .trim()
            .parse()
            .map_err(|_| "malformed soft-constraint weight".to_string().gloss())?;
        (Some(weight), stripped[end + 1..].trim())
    } else {
        (None, clause)
    };

    let (sense, sense_str) = if rest.contains(">=") {
        (RawSense::Ge, ">=")
    } else if rest.contains("<=") {
        (RawSense::Le, "<=")
    } else if rest.contains('=') {
        (RawSense::Eq, "=")
    } else {
        return Err(format!("constraint has no relational operator: '{rest}'").gloss());
    };

    let mut split = rest.splitn(2, sense_str);
    let lhs = split
        .next()
        .ok_or_else(|| "missing constraint left-hand side".to_string().gloss())?;
    let rhs_str = split
        .next()
        .ok_or_else(|| "missing constraint right-hand side".to_string().gloss())?;
    let mut rhs: f64 = rhs_str
        .trim()
        .parse()
        .map_err(|_| format!("bad right-hand side '{}'", rhs_str.trim()).gloss())?;

    let terms = tokenize_terms(lhs)?;
    let mut coefficients: Vec<(String, f64)> = Vec::new();
    for term in &terms {
        let (var, coeff, constant) = linearise_term(term, model, next_aux);
        coefficients.push((var, coeff));
        rhs -= constant;
    }

    model.constraints.push(RawConstraint {
        name: format!("c{}", model.constraints.len() + 1),
        coefficients,
        sense,
        rhs,
        weight,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hard_linear_constraint() {
        let text = "* #variable= 2 #constraint= 1\nmin: +1 x1 +2 x2 ;\n+1 x1 +1 x2 >= 1 ;\n";
        let model = parse_str(text).expect("valid OPB");
        assert_eq!(model.objective, vec![("x1".into(), 1.0), ("x2".into(), 2.0)]);
        assert_eq!(model.constraints.len(), 1);
        assert_eq!(model.constraints[0].sense, RawSense::Ge);
        assert_eq!(model.constraints[0].rhs, 1.0);
    }

    #[test]
    fn expands_negated_literal() {
        let text = "min: +1 ~x1 ;\n+1 ~x1 >= 0 ;\n";
        let model = parse_str(text).expect("valid OPB");
        assert_eq!(model.objective, vec![("x1".into(), -1.0)]);
        assert_eq!(model.objective_constant, 1.0);
    }

    #[test]
    fn expands_literal_product_into_and_auxiliary() {
        let text = "min: +1 x1 ;\n+1 x1 x2 >= 1 ;\n";
        let model = parse_str(text).expect("valid OPB");
        // one AND auxiliary plus its two defining rows on top of the main row.
        assert_eq!(model.constraints.len(), 3);
        assert!(model.bounds.contains_key("__and_aux_1"));
    }

    #[test]
    fn parses_soft_constraint_weight() {
        let text = "min: +1 x1 ;\n[10] +1 x1 >= 1 ;\n";
        let model = parse_str(text).expect("valid OPB");
        assert_eq!(model.constraints[0].weight, Some(10.0));
    }
}
