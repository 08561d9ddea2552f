use super::ids::{ConstraintId, VariableId};

/// A group of binaries tied by a set-partitioning equality, plus the
/// invariant that exactly one member holds value 1.
#[derive(Debug, Clone)]
pub struct Selection {
    pub members: Vec<VariableId>,
    pub constraint: ConstraintId,
    pub selected: VariableId,
}

impl Selection {
    pub fn new(members: Vec<VariableId>, constraint: ConstraintId, selected: VariableId) -> Self {
        Self {
            members,
            constraint,
            selected,
        }
    }

    pub fn others(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.members.iter().copied().filter(move |v| *v != self.selected)
    }
}
