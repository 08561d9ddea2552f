use super::ids::VariableId;

/// A linear form `sum(c_v * v) + const`, with a cached value the evaluator
/// is the sole writer of.
#[derive(Debug, Clone)]
pub struct Expression {
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
    pub value: f64,
    /// Set when the expression holds a user-supplied nonlinear function
    /// rather than a plain weighted sum; forces the evaluator slow path.
    pub nonlinear: bool,
}

impl Expression {
    pub fn linear(terms: Vec<(VariableId, f64)>, constant: f64) -> Self {
        Self {
            terms,
            constant,
            value: constant,
            nonlinear: false,
        }
    }

    pub fn coefficient_of(&self, var: VariableId) -> f64 {
        self.terms
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    /// Replaces every occurrence of `var` with `coeff_of_var * expr`, folding
    /// the dependent variable's own constant contribution into `self`.
    /// Used by dependent-variable elimination during presolve.
    pub fn substitute(&mut self, var: VariableId, expr: &Expression) {
        let Some(pos) = self.terms.iter().position(|(v, _)| *v == var) else {
            return;
        };
        let (_, coeff) = self.terms.remove(pos);
        self.constant += coeff * expr.constant;
        for (v, c) in &expr.terms {
            if let Some((_, existing)) = self.terms.iter_mut().find(|(ev, _)| ev == v) {
                *existing += coeff * c;
            } else {
                self.terms.push((*v, coeff * c));
            }
        }
        self.terms.retain(|(_, c)| c.abs() > 1e-12);
    }
}
