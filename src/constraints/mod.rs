//! Constraint validators and the penalized objective.
//!
//! Every validator answers the same question for a route or a whole
//! solution: is it feasible, and by how much is it violated. A
//! [`ConstraintSet`] runs the active validators and folds them into one
//! [`Evaluation`]:
//!
//! ```text
//! objective = total_cost + penalty_weight * total_violation
//! ```
//!
//! Violations are values, never errors, so the search can move through
//! mildly infeasible states.

mod capacity;
mod coverage;
mod fleet;
mod time_window;
mod traffic;

pub use capacity::CapacityConstraint;
pub use coverage::CoverageConstraint;
pub use fleet::FleetConstraint;
pub use time_window::{simulate, Schedule, TimeWindowConstraint};
pub use traffic::DynamicTrafficConstraint;

use std::fmt;

use serde::Serialize;

use crate::models::{Instance, Route, RouteId, Solution};

/// Penalty per unit of violation when none is configured.
pub const DEFAULT_PENALTY_WEIGHT: f64 = 1000.0;

/// Outcome of one validator on a route or solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    /// Whether the constraint holds.
    pub feasible: bool,
    /// Non-negative violation amount; zero when feasible.
    pub violation: f64,
}

impl Validation {
    /// A satisfied constraint.
    pub fn satisfied() -> Self {
        Self {
            feasible: true,
            violation: 0.0,
        }
    }

    /// A constraint violated by `amount`. Non-positive amounts count as satisfied.
    pub fn violated(amount: f64) -> Self {
        if amount > 0.0 {
            Self {
                feasible: false,
                violation: amount,
            }
        } else {
            Self::satisfied()
        }
    }

    /// Conjunction of two outcomes; violations add up.
    pub fn combine(self, other: Validation) -> Validation {
        Validation {
            feasible: self.feasible && other.feasible,
            violation: self.violation + other.violation,
        }
    }
}

/// A feasibility rule for routes and solutions.
///
/// Route-local constraints only implement [`validate_route`]; the solution
/// result is then the sum over routes. Constraints that look across routes
/// override [`validate_solution`] and return `false` from
/// [`is_route_local`].
///
/// [`validate_route`]: Constraint::validate_route
/// [`validate_solution`]: Constraint::validate_solution
/// [`is_route_local`]: Constraint::is_route_local
pub trait Constraint: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Checks a single route.
    fn validate_route(&self, _route: &Route, _instance: &Instance) -> Validation {
        Validation::satisfied()
    }

    /// Checks a whole solution.
    fn validate_solution(&self, solution: &Solution) -> Validation {
        solution
            .routes()
            .iter()
            .map(|r| self.validate_route(r, solution.instance()))
            .fold(Validation::satisfied(), Validation::combine)
    }

    /// `true` if the solution result is the sum of the route results.
    fn is_route_local(&self) -> bool {
        true
    }
}

/// One violated constraint in an [`Evaluation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Name of the violated constraint.
    pub constraint: &'static str,
    /// Offending route, or `None` for solution-level violations.
    pub route: Option<RouteId>,
    /// Violation amount.
    pub amount: f64,
}

/// Cost, violation and objective of a solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Sum of route distances.
    pub distance: f64,
    /// Sum of route distances times cost multipliers.
    pub cost: f64,
    /// Sum of all violation amounts.
    pub violation: f64,
    /// `true` iff every constraint holds.
    pub feasible: bool,
    /// `cost + penalty_weight * violation`.
    pub objective: f64,
    /// Individual violations, route-local ones first.
    pub violations: Vec<Violation>,
}

/// The active validators plus the penalty weight.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_ecoroute::constraints::ConstraintSet;
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point, Solution};
///
/// let mut b = InstanceBuilder::new("over");
/// b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 8)).unwrap();
/// b.add_customer(Customer::new(2, Point::new(-1.0, 0.0), 8)).unwrap();
/// b.fleet(Fleet::homogeneous(10, 1));
/// let mut sol = Solution::new(Arc::new(b.build().unwrap()));
/// sol.open_route(0, vec![1, 2]);
///
/// let eval = ConstraintSet::new(100.0).evaluate(&sol);
/// assert!(!eval.feasible);
/// assert!((eval.violation - 6.0).abs() < 1e-10);
/// assert!((eval.objective - (4.0 + 600.0)).abs() < 1e-10);
/// ```
pub struct ConstraintSet {
    constraints: Vec<Box<dyn Constraint>>,
    penalty_weight: f64,
}

impl ConstraintSet {
    /// Capacity, time window, fleet and coverage validators.
    pub fn new(penalty_weight: f64) -> Self {
        Self::empty(penalty_weight)
            .with(CapacityConstraint)
            .with(TimeWindowConstraint)
            .with(FleetConstraint)
            .with(CoverageConstraint)
    }

    /// No validators; every solution is feasible.
    pub fn empty(penalty_weight: f64) -> Self {
        Self {
            constraints: Vec::new(),
            penalty_weight,
        }
    }

    /// Adds a validator.
    pub fn with(mut self, constraint: impl Constraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Penalty per unit of violation.
    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// Names of the active validators.
    pub fn names(&self) -> Vec<&'static str> {
        self.constraints.iter().map(|c| c.name()).collect()
    }

    /// Route-local validators on one route.
    pub fn check_route(&self, route: &Route, instance: &Instance) -> Validation {
        self.constraints
            .iter()
            .filter(|c| c.is_route_local())
            .map(|c| c.validate_route(route, instance))
            .fold(Validation::satisfied(), Validation::combine)
    }

    /// Validators that look across routes, on the whole solution.
    pub fn check_global(&self, solution: &Solution) -> Validation {
        self.constraints
            .iter()
            .filter(|c| !c.is_route_local())
            .map(|c| c.validate_solution(solution))
            .fold(Validation::satisfied(), Validation::combine)
    }

    /// Objective contribution of one route: cost plus weighted local violation.
    pub fn route_objective(&self, route: &Route, instance: &Instance) -> f64 {
        route.cost(instance) + self.penalty_weight * self.check_route(route, instance).violation
    }

    /// Runs every validator over the solution.
    pub fn evaluate(&self, solution: &Solution) -> Evaluation {
        let instance = solution.instance();
        let mut feasible = true;
        let mut violation = 0.0;
        let mut violations = Vec::new();

        for route in solution.routes() {
            for c in self.constraints.iter().filter(|c| c.is_route_local()) {
                let v = c.validate_route(route, instance);
                feasible &= v.feasible;
                violation += v.violation;
                if !v.feasible {
                    violations.push(Violation {
                        constraint: c.name(),
                        route: Some(route.id()),
                        amount: v.violation,
                    });
                }
            }
        }
        for c in self.constraints.iter().filter(|c| !c.is_route_local()) {
            let v = c.validate_solution(solution);
            feasible &= v.feasible;
            violation += v.violation;
            if !v.feasible {
                violations.push(Violation {
                    constraint: c.name(),
                    route: None,
                    amount: v.violation,
                });
            }
        }

        let cost = solution.total_cost();
        Evaluation {
            distance: solution.total_distance(),
            cost,
            violation,
            feasible,
            objective: cost + self.penalty_weight * violation,
            violations,
        }
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::new(DEFAULT_PENALTY_WEIGHT)
    }
}

impl fmt::Debug for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintSet")
            .field("constraints", &self.names())
            .field("penalty_weight", &self.penalty_weight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, TimeWindow, VehicleType};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new("mixed");
        b.add_customer(Customer::new(1, Point::new(10.0, 0.0), 5).with_time_window(
            TimeWindow::new(8.0, 9.0).expect("valid"),
        ))
        .expect("ok");
        b.add_customer(Customer::new(2, Point::new(0.0, 3.0), 12))
            .expect("ok");
        b.add_customer(Customer::new(3, Point::new(0.0, -3.0), 4))
            .expect("ok");
        b.fleet(Fleet::new(vec![VehicleType::new("van", 15, 1)]));
        Arc::new(b.build().expect("valid"))
    }

    #[test]
    fn test_unreachable_window_scenario() {
        let mut sol = Solution::new(instance());
        sol.open_route(0, vec![1]);
        let route = sol.route(0);
        let v = TimeWindowConstraint.validate_route(route, sol.instance());
        assert!(!v.feasible);
        assert!((v.violation - 1.0).abs() < 1e-10);

        let eval = ConstraintSet::empty(1.0)
            .with(TimeWindowConstraint)
            .evaluate(&sol);
        assert!(!eval.feasible);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.violations[0].constraint, "time_window");
    }

    #[test]
    fn test_aggregate_sums_all_validators() {
        let mut sol = Solution::new(instance());
        sol.open_route(0, vec![2, 3]);
        sol.open_route(0, vec![1]);
        let eval = ConstraintSet::new(10.0).evaluate(&sol);
        // capacity: 16 - 15; fleet: one van too many; time window: 1 late
        assert!((eval.violation - 3.0).abs() < 1e-10);
        assert!(!eval.feasible);
        assert!((eval.objective - (eval.cost + 30.0)).abs() < 1e-10);
    }

    #[test]
    fn test_feasible_solution() {
        let mut b = InstanceBuilder::new("ok");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 5))
            .expect("ok");
        b.fleet(Fleet::homogeneous(10, 1));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1]);
        let eval = ConstraintSet::default().evaluate(&sol);
        assert!(eval.feasible);
        assert_eq!(eval.violation, 0.0);
        assert!((eval.objective - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_check_route_and_global_split() {
        let mut sol = Solution::new(instance());
        sol.open_route(0, vec![2, 3]);
        let set = ConstraintSet::default();
        let local = set.check_route(sol.route(0), sol.instance());
        assert!((local.violation - 1.0).abs() < 1e-10);
        // customer 1 unserved
        let global = set.check_global(&sol);
        assert!((global.violation - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_validation_combine() {
        let v = Validation::satisfied().combine(Validation::violated(2.0));
        assert!(!v.feasible);
        assert_eq!(v.violation, 2.0);
        assert!(Validation::violated(0.0).feasible);
    }

    proptest! {
        #[test]
        fn prop_objective_at_least_cost(
            demands in proptest::collection::vec(0i32..30, 1..8),
            capacity in 1i32..40,
            weight in 0.0f64..5000.0,
        ) {
            let mut b = InstanceBuilder::new("prop");
            for (i, d) in demands.iter().enumerate() {
                let angle = i as f64;
                b.add_customer(Customer::new(i + 1, Point::new(angle.cos() * 5.0, angle.sin() * 5.0), *d))
                    .expect("ok");
            }
            b.fleet(Fleet::homogeneous(capacity, 1));
            let inst = Arc::new(b.build().expect("valid"));
            let mut sol = Solution::new(inst);
            let all: Vec<usize> = (1..=demands.len()).collect();
            let (first, rest) = all.split_at(all.len() / 2 + 1);
            sol.open_route(0, first.to_vec());
            if !rest.is_empty() {
                sol.open_route(0, rest.to_vec());
            }
            let eval = ConstraintSet::new(weight).evaluate(&sol);
            prop_assert!(eval.objective >= eval.cost);
            prop_assert!(eval.violation >= 0.0);
        }
    }
}
