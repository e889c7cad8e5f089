//! Search outcome types.

use std::fmt;
use std::time::Duration;

use crate::constraints::Evaluation;
use crate::models::Solution;

/// Why a search loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Iteration budget used up.
    MaxIterations,
    /// Temperature dropped below the floor.
    MinTemperature,
    /// Too many iterations without improving the best solution.
    NoImprovement,
    /// Wall-clock limit reached.
    Deadline,
    /// Every candidate was tabu and none met the aspiration criterion.
    NoAdmissibleMove,
    /// The solution has no moves at all.
    EmptyNeighborhood,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::MaxIterations => "max iterations",
            StopReason::MinTemperature => "min temperature",
            StopReason::NoImprovement => "no improvement",
            StopReason::Deadline => "deadline",
            StopReason::NoAdmissibleMove => "no admissible move",
            StopReason::EmptyNeighborhood => "empty neighborhood",
        };
        f.write_str(s)
    }
}

/// Counters collected during a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Moves applied.
    pub accepted_moves: usize,
    /// Applied moves with negative delta.
    pub improving_moves: usize,
    /// Tabu moves applied through aspiration.
    pub aspirations: usize,
    /// Tabu candidates skipped.
    pub tabu_rejections: usize,
    /// Temperature at the end (annealing only).
    pub final_temperature: Option<f64>,
}

/// Result of a metaheuristic run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Best solution found.
    pub best: Solution,
    /// Evaluation of `best`.
    pub evaluation: Evaluation,
    /// Iterations performed.
    pub iterations: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Current objective after each iteration, starting with the initial one.
    pub objective_trace: Vec<f64>,
    /// Best objective after each iteration, starting with the initial one.
    pub best_trace: Vec<f64>,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Counters.
    pub stats: SearchStats,
}

impl SearchReport {
    /// Whether the best solution satisfies every constraint.
    pub fn feasible(&self) -> bool {
        self.evaluation.feasible
    }

    /// Objective of the best solution.
    pub fn best_objective(&self) -> f64 {
        self.evaluation.objective
    }
}
