//! Greedy nearest-neighbor construction.
//!
//! # Algorithm
//!
//! 1. Open a route on the largest vehicle type that still has vehicles left.
//! 2. Append the unserved customer whose insertion at the end of the route
//!    costs least, `d(end, c) + d(c, 0) - d(end, 0)`, among those that fit
//!    the remaining capacity.
//! 3. When nothing fits, close the route and downsize it to the cheapest
//!    available type that carries its load. Repeat from 1.
//!
//! When every type is used up, routes keep opening on the largest type; the
//! fleet validator then reports the excess.
//!
//! # Complexity
//!
//! O(n²) where n = number of customers.

use std::sync::Arc;

use log::debug;

use crate::error::RoutingError;
use crate::models::{Instance, Solution, DEPOT};

/// Builds a solution by greedy nearest-neighbor appending.
///
/// Fails with [`RoutingError::Infeasible`] if some customer fits no vehicle
/// type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_ecoroute::constructive::nearest_neighbor;
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
///
/// let mut b = InstanceBuilder::new("line");
/// for i in 1..=3 {
///     b.add_customer(Customer::new(i, Point::new(i as f64, 0.0), 10)).unwrap();
/// }
/// b.fleet(Fleet::homogeneous(20, 2));
/// let solution = nearest_neighbor(Arc::new(b.build().unwrap())).unwrap();
///
/// assert_eq!(solution.served_count(), 3);
/// assert_eq!(solution.num_routes(), 2);
/// ```
pub fn nearest_neighbor(instance: Arc<Instance>) -> Result<Solution, RoutingError> {
    instance.check_serviceable()?;

    let fleet = instance.fleet();
    let mut remaining: Vec<usize> = fleet.types().iter().map(|t| t.count()).collect();
    let mut served = vec![false; instance.num_customers() + 1];
    let mut unserved = instance.num_customers();
    let mut solution = Solution::new(Arc::clone(&instance));

    while unserved > 0 {
        let Some(vehicle_type) = largest_available(&instance, &remaining) else {
            break;
        };
        let capacity = fleet.types()[vehicle_type].capacity();

        let mut route = Vec::new();
        let mut load = 0;
        let mut end = DEPOT;
        loop {
            let mut best: Option<(usize, f64)> = None;
            for c in instance.customer_locations() {
                if served[c] || load + instance.demand(c) > capacity {
                    continue;
                }
                let cost = instance.distance(end, c) + instance.distance(c, DEPOT)
                    - instance.distance(end, DEPOT);
                if best.map_or(true, |(_, b)| cost < b) {
                    best = Some((c, cost));
                }
            }
            let Some((c, _)) = best else {
                break;
            };
            served[c] = true;
            unserved -= 1;
            load += instance.demand(c);
            route.push(c);
            end = c;
        }

        if route.is_empty() {
            break;
        }
        let assigned = fleet
            .cheapest_among(load, |t| remaining[t] > 0)
            .unwrap_or(vehicle_type);
        remaining[assigned] = remaining[assigned].saturating_sub(1);
        solution.open_route(assigned, route);
    }

    debug!(
        "nearest neighbor built {} routes for {} customers",
        solution.num_routes(),
        instance.num_customers()
    );
    Ok(solution)
}

fn largest_available(instance: &Instance, remaining: &[usize]) -> Option<usize> {
    let fleet = instance.fleet();
    let mut best: Option<usize> = None;
    for (idx, t) in fleet.types().iter().enumerate() {
        if remaining[idx] == 0 {
            continue;
        }
        if best.map_or(true, |b| t.capacity() > fleet.types()[b].capacity()) {
            best = Some(idx);
        }
    }
    best.or_else(|| fleet.largest())
}
