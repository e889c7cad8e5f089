//! Customer coverage.

use super::{Constraint, Validation};
use crate::models::Solution;

/// Every customer must be on exactly one route. Violation is the number of
/// customers left out plus the number of repeated visits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageConstraint;

impl Constraint for CoverageConstraint {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn validate_solution(&self, solution: &Solution) -> Validation {
        let missing = solution.unserved().len() + solution.duplicate_count();
        Validation::violated(missing as f64)
    }

    fn is_route_local(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point};
    use std::sync::Arc;

    #[test]
    fn test_counts_unserved() {
        let mut b = InstanceBuilder::new("cov");
        for i in 1..=3 {
            b.add_customer(Customer::new(i, Point::new(i as f64, 0.0), 1))
                .expect("ok");
        }
        b.fleet(Fleet::homogeneous(10, 3));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        assert_eq!(CoverageConstraint.validate_solution(&sol).violation, 3.0);
        sol.open_route(0, vec![2]);
        assert_eq!(CoverageConstraint.validate_solution(&sol).violation, 2.0);
        sol.open_route(0, vec![1, 3]);
        assert!(CoverageConstraint.validate_solution(&sol).feasible);
    }

    #[test]
    fn test_repeated_visit_does_not_hide_missing() {
        let mut b = InstanceBuilder::new("dup");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 1))
            .expect("ok");
        b.add_customer(Customer::new(2, Point::new(2.0, 0.0), 1))
            .expect("ok");
        b.fleet(Fleet::homogeneous(10, 2));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1]);
        sol.push_route_unchecked(0, vec![1]);
        assert_eq!(sol.served_count(), 2);
        assert_eq!(sol.duplicate_count(), 1);

        let v = CoverageConstraint.validate_solution(&sol);
        assert!(!v.feasible);
        assert_eq!(v.violation, 2.0);
    }

    #[test]
    #[should_panic(expected = "already routed")]
    fn test_open_route_rejects_routed_customer() {
        let mut b = InstanceBuilder::new("dup");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 1))
            .expect("ok");
        b.fleet(Fleet::homogeneous(10, 2));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1]);
        sol.open_route(0, vec![1]);
    }
}
