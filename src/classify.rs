//! Structural pattern-matching of linear constraints into canonical types.
//!
//! Classification looks only at a constraint's coefficient vector, sense,
//! right-hand side and the bounds/senses of the variables it touches; it
//! never looks at current values. Patterns are tried most-specific first and
//! the first match wins, exactly as the presolver and neighbourhood
//! dispatcher expect.

use crate::model::ids::VariableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Singleton,
    Aggregation,
    VariableBound,
    SetPartitioning,
    SetPacking,
    SetCovering,
    Cardinality,
    InvariantKnapsack,
    MultipleCovering,
    ExclusiveOr,
    ExclusiveNor,
    Precedence,
    Intermediate,
    InvertedIntegers,
    BalancedIntegers,
    ConstantSumIntegers,
    ConstantDifferenceIntegers,
    ConstantRatioIntegers,
    TrinomialExclusiveNor,
    EquationKnapsack,
    BinPacking,
    Knapsack,
    IntegerKnapsack,
    BinaryFlow,
    IntegerFlow,
    SoftSelection,
    MinMax,
    MaxMin,
    GF2,
    GeneralLinear,
    Nonlinear,
}

/// A variable's static facts as seen by the classifier: bounds and whether
/// it is a mutable (non-fixed) variable.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyVariable {
    pub id: VariableId,
    pub coefficient: f64,
    pub lower: i64,
    pub upper: i64,
    pub fixed: bool,
}

impl ClassifyVariable {
    pub fn is_binary(&self) -> bool {
        self.lower == 0 && self.upper == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifySense {
    Le,
    Eq,
    Ge,
}

pub struct ClassifyInput<'a> {
    pub variables: &'a [ClassifyVariable],
    pub sense: ClassifySense,
    pub rhs: f64,
    pub nonlinear: bool,
}

/// Returns the matched type, plus an auxiliary variable when the pattern
/// designates one (only `Intermediate` currently does).
pub fn classify(input: &ClassifyInput) -> (ConstraintType, Option<VariableId>) {
    if input.nonlinear {
        return (ConstraintType::Nonlinear, None);
    }

    let mutable: Vec<&ClassifyVariable> = input.variables.iter().filter(|v| !v.fixed).collect();

    if mutable.len() == 1 {
        return (ConstraintType::Singleton, None);
    }

    let all_binary = mutable.iter().all(|v| v.is_binary());
    let all_coeff_one = mutable.iter().all(|v| (v.coefficient - 1.0).abs() < 1e-9);
    let all_coeff_one_abs = mutable.iter().all(|v| (v.coefficient.abs() - 1.0).abs() < 1e-9);
    let all_positive_int_coeff = mutable
        .iter()
        .all(|v| v.coefficient > 0.0 && (v.coefficient.fract()).abs() < 1e-9);

    if mutable.len() == 2 {
        let (a, b) = (mutable[0], mutable[1]);
        if input.sense == ClassifySense::Eq && a.coefficient * b.coefficient < 0.0 {
            return (ConstraintType::Aggregation, None);
        }
        if all_binary && input.sense == ClassifySense::Eq && a.coefficient * b.coefficient < 0.0 {
            return (ConstraintType::ExclusiveNor, None);
        }
        if all_binary
            && input.sense == ClassifySense::Le
            && a.coefficient > 0.0
            && b.coefficient > 0.0
            && input.rhs == 1.0
        {
            return (ConstraintType::ExclusiveOr, None);
        }
        if all_binary && input.sense == ClassifySense::Le && a.coefficient > 0.0 && b.coefficient < 0.0 {
            return (ConstraintType::Precedence, None);
        }
        return (ConstraintType::VariableBound, None);
    }

    if all_binary && all_coeff_one {
        match (input.sense, input.rhs) {
            (ClassifySense::Eq, r) if r == 1.0 => return (ConstraintType::SetPartitioning, None),
            (ClassifySense::Le, r) if r == 1.0 => return (ConstraintType::SetPacking, None),
            (ClassifySense::Ge, r) if r == 1.0 => return (ConstraintType::SetCovering, None),
            (ClassifySense::Eq, r) if r > 1.0 => return (ConstraintType::Cardinality, None),
            (ClassifySense::Le, r) if r > 1.0 => return (ConstraintType::Cardinality, None),
            (ClassifySense::Ge, r) if r > 1.0 => return (ConstraintType::MultipleCovering, None),
            _ => {}
        }
    }

    if all_binary && all_positive_int_coeff && input.sense == ClassifySense::Le {
        return (ConstraintType::InvariantKnapsack, None);
    }
    if all_binary && all_positive_int_coeff && input.sense == ClassifySense::Eq {
        return (ConstraintType::EquationKnapsack, None);
    }

    if let Some(aux) = mutable.iter().find(|v| (v.coefficient.abs() - 1.0).abs() < 1e-9) {
        if input.sense == ClassifySense::Eq {
            return (ConstraintType::Intermediate, Some(aux.id));
        }
    }

    if all_binary && all_coeff_one_abs && input.sense == ClassifySense::Eq {
        let positives = mutable.iter().filter(|v| v.coefficient > 0.0).count();
        let negatives = mutable.len() - positives;
        if positives == 1 && negatives > 1 {
            return (ConstraintType::InvertedIntegers, None);
        }
        if positives == negatives {
            return (ConstraintType::BalancedIntegers, None);
        }
        if mutable.len() == 3 {
            return (ConstraintType::TrinomialExclusiveNor, None);
        }
    }

    if mutable.len() == 2 && input.sense == ClassifySense::Eq && !all_binary {
        let (a, b) = (mutable[0], mutable[1]);
        if a.coefficient == b.coefficient {
            return (ConstraintType::ConstantDifferenceIntegers, None);
        }
        if a.coefficient.signum() == b.coefficient.signum() {
            return (ConstraintType::ConstantRatioIntegers, None);
        }
        return (ConstraintType::ConstantSumIntegers, None);
    }

    if !all_binary && all_positive_int_coeff && input.sense == ClassifySense::Le {
        return (ConstraintType::Knapsack, None);
    }
    if !all_binary && all_positive_int_coeff {
        return (ConstraintType::IntegerKnapsack, None);
    }

    (ConstraintType::GeneralLinear, None)
}
