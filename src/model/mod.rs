//! Entity arenas and the incremental evaluation API that sits on top of
//! them. Every cross-reference between a variable, an expression and a
//! constraint is a numeric index rather than a pointer, so the arenas stay
//! acyclic in ownership terms even though the logical graph is not.

pub mod constraint;
pub mod expression;
pub mod ids;
pub mod moves;
pub mod selection;
pub mod store;
pub mod variable;

pub use constraint::{Constraint, ConstraintSense};
pub use expression::Expression;
pub use ids::{ConstraintId, ExpressionId, SelectionId, VariableId};
pub use moves::{Move, MoveSense};
pub use selection::Selection;
pub use store::{ModelStore, SolutionScore};
pub use variable::{Variable, VariableSense};
