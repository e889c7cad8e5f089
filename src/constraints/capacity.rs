//! Vehicle capacity.

use super::{Constraint, Validation};
use crate::models::{sequence_load, Instance, Route};

/// Route load must not exceed the capacity of its vehicle type.
///
/// Violation is the excess demand. Routes with an unknown vehicle type are
/// left to [`FleetConstraint`](super::FleetConstraint).
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityConstraint;

impl CapacityConstraint {
    /// Excess demand of `customers` on a vehicle of type `vehicle_type`.
    pub fn excess(instance: &Instance, vehicle_type: usize, customers: &[usize]) -> i32 {
        match instance.fleet().get(vehicle_type) {
            Some(t) => (sequence_load(instance, customers) - t.capacity()).max(0),
            None => 0,
        }
    }
}

impl Constraint for CapacityConstraint {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn validate_route(&self, route: &Route, instance: &Instance) -> Validation {
        let capacity = match instance.fleet().get(route.vehicle_type()) {
            Some(t) => t.capacity(),
            None => return Validation::satisfied(),
        };
        Validation::violated((route.load() - capacity).max(0) as f64)
    }
}
