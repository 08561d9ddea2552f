//! Feasible / global-augmented / local-augmented incumbent bookkeeping.

use crate::model::VariableId;

const EPSILON: f64 = 1e-10;

/// A snapshot of one incumbent: its score plus enough of the solution to
/// report or resume from.
#[derive(Debug, Clone)]
pub struct Incumbent {
    pub objective: f64,
    pub augmented: f64,
    pub total_violation: f64,
    pub values: Vec<(VariableId, i64)>,
}

/// 3-bit status returned by [`IncumbentHolder::try_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStatus(u8);

impl UpdateStatus {
    pub const LOCAL_AUGMENTED: UpdateStatus = UpdateStatus(0b001);
    pub const GLOBAL_AUGMENTED: UpdateStatus = UpdateStatus(0b010);
    pub const FEASIBLE: UpdateStatus = UpdateStatus(0b100);

    pub fn empty() -> Self {
        UpdateStatus(0)
    }

    pub fn contains(self, other: UpdateStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOrAssign for UpdateStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

pub struct IncumbentHolder {
    pub feasible: Option<Incumbent>,
    pub global_augmented: Option<Incumbent>,
    pub local_augmented: Option<Incumbent>,
}

impl IncumbentHolder {
    pub fn new() -> Self {
        Self {
            feasible: None,
            global_augmented: None,
            local_augmented: None,
        }
    }

    /// Resets only the local-restart incumbent; global/feasible survive.
    pub fn reset_local(&mut self) {
        self.local_augmented = None;
    }

    /// Compares `candidate` against all three incumbents and replaces any it
    /// strictly beats (ties do not count). Returns which were beaten.
    pub fn try_update(&mut self, candidate: &Incumbent, feasible: bool) -> UpdateStatus {
        let mut status = UpdateStatus::empty();

        let beats = |current: &Option<Incumbent>, value: f64| match current {
            None => true,
            Some(incumbent) => value < incumbent.augmented - EPSILON,
        };

        if beats(&self.local_augmented, candidate.augmented) {
            self.local_augmented = Some(candidate.clone());
            status |= UpdateStatus::LOCAL_AUGMENTED;
        }
        if beats(&self.global_augmented, candidate.augmented) {
            self.global_augmented = Some(candidate.clone());
            status |= UpdateStatus::GLOBAL_AUGMENTED;
        }
        if feasible {
            let beats_feasible = match &self.feasible {
                None => true,
                Some(incumbent) => candidate.objective < incumbent.objective - EPSILON,
            };
            if beats_feasible {
                self.feasible = Some(candidate.clone());
                status |= UpdateStatus::FEASIBLE;
            }
        }
        status
    }
}

impl Default for IncumbentHolder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incumbent(objective: f64, augmented: f64) -> Incumbent {
        Incumbent {
            objective,
            augmented,
            total_violation: 0.0,
            values: Vec::new(),
        }
    }

    #[test]
    fn first_update_always_beats_empty_holder() {
        let mut holder = IncumbentHolder::new();
        let status = holder.try_update(&incumbent(5.0, 5.0), true);
        assert!(status.contains(UpdateStatus::LOCAL_AUGMENTED));
        assert!(status.contains(UpdateStatus::GLOBAL_AUGMENTED));
        assert!(status.contains(UpdateStatus::FEASIBLE));
    }

    #[test]
    fn ties_do_not_count_as_updates() {
        let mut holder = IncumbentHolder::new();
        holder.try_update(&incumbent(5.0, 5.0), true);
        let status = holder.try_update(&incumbent(5.0, 5.0), true);
        assert!(status.is_empty());
    }

    #[test]
    fn local_reset_leaves_global_and_feasible_untouched() {
        let mut holder = IncumbentHolder::new();
        holder.try_update(&incumbent(5.0, 5.0), true);
        holder.reset_local();
        assert!(holder.local_augmented.is_none());
        assert!(holder.global_augmented.is_some());
        assert!(holder.feasible.is_some());
    }
}
