//! Route duration under time-dependent traffic.

use super::{simulate, Constraint, Validation};
use crate::models::{Instance, Route};

/// Vehicles must be back at the depot by `horizon`.
///
/// Travel times already follow the instance's traffic profile; this validator
/// turns the resulting return time into a violation. Without a horizon it
/// never fires, and under the identity profile it reduces to a plain
/// route-duration limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicTrafficConstraint {
    horizon: Option<f64>,
}

impl DynamicTrafficConstraint {
    /// A validator that never fires.
    pub fn new() -> Self {
        Self { horizon: None }
    }

    /// Requires every route to end by `horizon`.
    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// The configured horizon.
    pub fn horizon(&self) -> Option<f64> {
        self.horizon
    }
}

impl Constraint for DynamicTrafficConstraint {
    fn name(&self) -> &'static str {
        "dynamic_traffic"
    }

    fn validate_route(&self, route: &Route, instance: &Instance) -> Validation {
        match self.horizon {
            Some(h) => Validation::violated(simulate(instance, route.customers()).return_time - h),
            None => Validation::satisfied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::TrafficProfile;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, Solution};
    use std::sync::Arc;

    fn solution(traffic: TrafficProfile) -> Solution {
        let mut b = InstanceBuilder::new("dyn");
        b.add_customer(Customer::new(1, Point::new(3.0, 0.0), 1))
            .expect("ok");
        b.fleet(Fleet::homogeneous(5, 1)).traffic(traffic);
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1]);
        sol
    }

    #[test]
    fn test_no_horizon_is_noop() {
        let sol = solution(TrafficProfile::urban_day());
        let v = DynamicTrafficConstraint::new().validate_route(sol.route(0), sol.instance());
        assert!(v.feasible);
    }

    #[test]
    fn test_rush_hour_breaks_horizon() {
        let c = DynamicTrafficConstraint::new().with_horizon(6.0);
        let calm = solution(TrafficProfile::identity());
        assert!(c.validate_route(calm.route(0), calm.instance()).feasible);

        let rush = solution(TrafficProfile::new(100.0, vec![1.5]).expect("valid"));
        let v = c.validate_route(rush.route(0), rush.instance());
        assert!(!v.feasible);
        assert!((v.violation - 3.0).abs() < 1e-10);
    }
}
