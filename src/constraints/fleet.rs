//! Fleet composition.

use super::{Constraint, Validation};
use crate::models::{Instance, Route, Solution};

/// Routes must use existing vehicle types, and no type may be used more
/// often than it is available.
///
/// Violation counts one unit per route with an unknown type plus one unit per
/// vehicle used beyond a type's count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetConstraint;

impl FleetConstraint {
    /// Vehicles used beyond availability, summed over types.
    pub fn excess_vehicles(instance: &Instance, used: &[usize]) -> usize {
        instance
            .fleet()
            .types()
            .iter()
            .zip(used)
            .map(|(t, &u)| u.saturating_sub(t.count()))
            .sum()
    }
}

impl Constraint for FleetConstraint {
    fn name(&self) -> &'static str {
        "fleet"
    }

    fn validate_route(&self, route: &Route, instance: &Instance) -> Validation {
        if instance.fleet().get(route.vehicle_type()).is_some() {
            Validation::satisfied()
        } else {
            Validation::violated(1.0)
        }
    }

    fn validate_solution(&self, solution: &Solution) -> Validation {
        let instance = solution.instance();
        let unknown = solution
            .routes()
            .iter()
            .filter(|r| instance.fleet().get(r.vehicle_type()).is_none())
            .count();
        let excess = Self::excess_vehicles(instance, &solution.vehicles_used());
        Validation::violated((unknown + excess) as f64)
    }

    fn is_route_local(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, VehicleType};
    use std::sync::Arc;

    fn solution() -> Solution {
        let mut b = InstanceBuilder::new("fleet");
        for i in 1..=4 {
            b.add_customer(Customer::new(i, Point::new(0.0, i as f64), 1))
                .expect("ok");
        }
        b.fleet(Fleet::new(vec![
            VehicleType::new("a", 10, 1),
            VehicleType::new("b", 10, 2),
        ]));
        Solution::new(Arc::new(b.build().expect("valid")))
    }

    #[test]
    fn test_within_counts() {
        let mut sol = solution();
        sol.open_route(0, vec![1]);
        sol.open_route(1, vec![2]);
        sol.open_route(1, vec![3, 4]);
        assert!(FleetConstraint.validate_solution(&sol).feasible);
    }

    #[test]
    fn test_count_exceeded() {
        let mut sol = solution();
        sol.open_route(0, vec![1]);
        sol.open_route(0, vec![2]);
        sol.open_route(0, vec![3]);
        let v = FleetConstraint.validate_solution(&sol);
        assert!(!v.feasible);
        assert_eq!(v.violation, 2.0);
    }

    #[test]
    fn test_unknown_type() {
        let mut sol = solution();
        sol.open_route(5, vec![1]);
        let v = FleetConstraint.validate_solution(&sol);
        assert_eq!(v.violation, 1.0);
        assert!(!FleetConstraint
            .validate_route(sol.route(0), sol.instance())
            .feasible);
    }
}
