//! PB-competition output: `o <obj>` lines as the incumbent improves, then a
//! final `s <status>` line and `v ±name` assignment lines.

use crate::Status;
use crate::model::ModelStore;

/// Prints an `o <obj>` line. Call once per strict feasible-incumbent
/// improvement.
pub fn report_incumbent(objective: f64) {
    if objective.fract() == 0.0 {
        println!("o {}", objective as i64);
    } else {
        println!("o {objective}");
    }
}

/// Prints the final `s` and `v` lines for a solved model. `store` must hold
/// the reported solution's variable assignment.
pub fn report_final(store: &ModelStore, status: Status) {
    println!("s {}", status.pb_label());
    if status != Status::Infeasible {
        for var in &store.variables {
            let sign = if var.value != 0 { '+' } else { '-' };
            println!("v {sign}{}", var.name);
        }
    }
}
