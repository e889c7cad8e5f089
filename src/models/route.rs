//! Routes and route identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::instance::{Instance, DEPOT};

/// Identifier of a route, unique within its solution.
///
/// Ids are handed out by [`Solution`](super::Solution) and stay attached to
/// the route while its position in the route list shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub(crate) u32);

impl RouteId {
    /// Raw numeric value.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Depot-to-depot distance of a customer sequence given as location indices.
///
/// An empty sequence has distance zero.
pub fn sequence_distance(instance: &Instance, customers: &[usize]) -> f64 {
    let mut total = 0.0;
    let mut prev = DEPOT;
    for &c in customers {
        total += instance.distance(prev, c);
        prev = c;
    }
    if prev != DEPOT {
        total += instance.distance(prev, DEPOT);
    }
    total
}

/// Total demand of a customer sequence.
pub fn sequence_load(instance: &Instance, customers: &[usize]) -> i32 {
    let total: i64 = customers.iter().map(|&c| i64::from(instance.demand(c))).sum();
    i32::try_from(total).unwrap_or(i32::MAX)
}

/// An ordered sequence of customers served by one vehicle.
///
/// The route starts and ends at the depot, which is not stored. Customers are
/// location indices into the instance. Distance and load are cached and kept
/// current by the owning solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    id: RouteId,
    vehicle_type: usize,
    customers: Vec<usize>,
    distance: f64,
    load: i32,
}

impl Route {
    pub(crate) fn new(
        id: RouteId,
        vehicle_type: usize,
        customers: Vec<usize>,
        instance: &Instance,
    ) -> Self {
        let mut route = Self {
            id,
            vehicle_type,
            customers,
            distance: 0.0,
            load: 0,
        };
        route.refresh(instance);
        route
    }

    pub(crate) fn refresh(&mut self, instance: &Instance) {
        self.distance = sequence_distance(instance, &self.customers);
        self.load = sequence_load(instance, &self.customers);
    }

    pub(crate) fn customers_mut(&mut self) -> &mut Vec<usize> {
        &mut self.customers
    }

    /// Route identifier.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Index of the assigned vehicle type in the fleet.
    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    /// Customers in visiting order (location indices).
    pub fn customers(&self) -> &[usize] {
        &self.customers
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    /// Returns `true` if the route has no customers.
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Depot-to-depot distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Total demand on board when leaving the depot.
    pub fn load(&self) -> i32 {
        self.load
    }

    /// Distance weighted by the vehicle type's cost multiplier.
    ///
    /// An unknown vehicle type is charged at multiplier 1.0; the fleet
    /// validator reports it separately.
    pub fn cost(&self, instance: &Instance) -> f64 {
        let mult = instance
            .fleet()
            .get(self.vehicle_type)
            .map_or(1.0, |t| t.cost_per_distance());
        self.distance * mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, VehicleType};

    fn line() -> Instance {
        let mut b = InstanceBuilder::new("line");
        for i in 1..=3 {
            b.add_customer(Customer::new(i, Point::new(i as f64, 0.0), 5))
                .expect("ok");
        }
        b.fleet(Fleet::new(vec![
            VehicleType::new("van", 20, 2).with_cost_per_distance(2.0),
        ]));
        b.build().expect("valid")
    }

    #[test]
    fn test_sequence_distance() {
        let inst = line();
        assert_eq!(sequence_distance(&inst, &[]), 0.0);
        assert!((sequence_distance(&inst, &[1, 2, 3]) - 6.0).abs() < 1e-10);
        assert!((sequence_distance(&inst, &[3, 1, 2]) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_route_cached_values() {
        let inst = line();
        let r = Route::new(RouteId(0), 0, vec![2, 1], &inst);
        assert_eq!(r.len(), 2);
        assert_eq!(r.load(), 10);
        assert!((r.distance() - 4.0).abs() < 1e-10);
        assert!((r.cost(&inst) - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_route_refresh() {
        let inst = line();
        let mut r = Route::new(RouteId(4), 0, vec![1], &inst);
        r.customers_mut().push(3);
        r.refresh(&inst);
        assert_eq!(r.load(), 10);
        assert!((r.distance() - 6.0).abs() < 1e-10);
        assert_eq!(r.id().to_string(), "r4");
    }

    #[test]
    fn test_sequence_load_saturates() {
        let mut b = InstanceBuilder::new("heavy");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), i32::MAX))
            .expect("ok");
        b.fleet(Fleet::homogeneous(10, 1));
        let inst = b.build().expect("valid");
        assert_eq!(sequence_load(&inst, &[1]), i32::MAX);
        assert_eq!(sequence_load(&inst, &[1, 1]), i32::MAX);
    }
}
