//! Local search: moves, neighborhoods and metaheuristic drivers.
//!
//! - [`Move`] — relocate, swap and 2-opt edits with exact inverses
//! - [`MoveEvaluator`] — objective deltas over the touched routes only
//! - [`simulated_annealing`] — Metropolis acceptance with geometric cooling
//! - [`tabu_search`] — steepest admissible move with aspiration
//!
//! Both drivers are single-threaded and take an explicit random generator;
//! parallelism happens across independent runs (see
//! [`Solver::solve_multi_start`](crate::solver::Solver::solve_multi_start)).

mod annealing;
mod moves;
mod neighborhood;
mod objective;
mod report;
mod tabu;

pub use annealing::{simulated_annealing, MoveWeights, SaConfig};
pub use moves::{Move, Position, Slot};
pub use neighborhood::{
    candidate_moves, enumerate_moves, random_move, spare_vehicle_type, MoveKind,
};
pub use objective::MoveEvaluator;
pub use report::{SearchReport, SearchStats, StopReason};
pub use tabu::{
    select_candidate, tabu_search, Candidate, Selection, TabuAttribute, TabuConfig, TabuList,
};
