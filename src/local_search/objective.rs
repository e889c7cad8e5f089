//! Incremental objective deltas.

use super::moves::Move;
use crate::constraints::ConstraintSet;
use crate::models::Solution;

/// Scores moves by re-evaluating only the routes they touch.
///
/// Route-local constraints and route costs are summed over the touched
/// routes before and after the move; validators that look across routes are
/// re-run on the whole solution, which is cheap for fleet and coverage.
#[derive(Debug, Clone, Copy)]
pub struct MoveEvaluator<'a> {
    constraints: &'a ConstraintSet,
}

impl<'a> MoveEvaluator<'a> {
    /// Creates an evaluator for the given constraint set.
    pub fn new(constraints: &'a ConstraintSet) -> Self {
        Self { constraints }
    }

    /// The constraint set in use.
    pub fn constraints(&self) -> &'a ConstraintSet {
        self.constraints
    }

    /// Full objective of a solution.
    pub fn objective(&self, solution: &Solution) -> f64 {
        self.constraints.evaluate(solution).objective
    }

    fn partial(&self, solution: &Solution, routes: &[usize]) -> f64 {
        let instance = solution.instance();
        let local: f64 = routes
            .iter()
            .map(|&r| self.constraints.route_objective(solution.route(r), instance))
            .sum();
        local + self.constraints.penalty_weight() * self.constraints.check_global(solution).violation
    }

    /// Applies `mv`, returning its inverse and the objective change.
    pub fn apply_scored(&self, solution: &mut Solution, mv: &Move) -> (Move, f64) {
        let before = self.partial(solution, &mv.touched_routes(solution));
        let inverse = mv.apply(solution);
        let after = self.partial(solution, &inverse.touched_routes(solution));
        (inverse, after - before)
    }

    /// Objective change `mv` would cause. The solution is left unchanged.
    pub fn delta(&self, solution: &mut Solution, mv: &Move) -> f64 {
        let (inverse, delta) = self.apply_scored(solution, mv);
        inverse.apply(solution);
        delta
    }
}
