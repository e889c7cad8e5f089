//! Clarke-Wright savings algorithm.
//!
//! # Algorithm
//!
//! The savings algorithm (Clarke & Wright, 1964) starts with each customer
//! on its own route (depot → customer → depot). It then merges routes by
//! computing the "savings" of serving two customers consecutively:
//!
//! ```text
//! s(i, j) = d(0, i) + d(0, j) - d(i, j)
//! ```
//!
//! Pairs are scanned in decreasing order of savings (stable, so equal values
//! keep their pair order). Two routes merge when `i` and `j` are endpoints of
//! different routes and some orientation of the joined route, with `i` and
//! `j` adjacent, fits a vehicle type's capacity and meets every time window.
//! Among such orientations the shortest wins.
//!
//! Finally each route gets the cheapest vehicle type that carries its load,
//! preferring types that still have vehicles left.
//!
//! # Complexity
//!
//! O(n² log n) where n = number of customers (dominated by sorting savings).
//!
//! # Reference
//!
//! Clarke, G. & Wright, J.W. (1964). "Scheduling of Vehicles from a Central
//! Depot to a Number of Delivery Points", *Operations Research* 12(4), 568-581.

use std::sync::Arc;

use log::debug;

use crate::constraints::simulate;
use crate::error::RoutingError;
use crate::models::{sequence_distance, sequence_load, Instance, Solution, DEPOT};

const LATENESS_TOLERANCE: f64 = 1e-9;

/// A savings value for merging two customers' routes.
#[derive(Debug)]
struct Saving {
    i: usize,
    j: usize,
    value: f64,
}

/// Constructs a solution using the Clarke-Wright savings algorithm.
///
/// Fails with [`RoutingError::Infeasible`] if some customer fits no vehicle
/// type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_ecoroute::constructive::clarke_wright_savings;
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
///
/// let mut b = InstanceBuilder::new("line");
/// for i in 1..=3 {
///     b.add_customer(Customer::new(i, Point::new(i as f64, 0.0), 10)).unwrap();
/// }
/// b.fleet(Fleet::homogeneous(30, 1));
/// let solution = clarke_wright_savings(Arc::new(b.build().unwrap())).unwrap();
///
/// assert_eq!(solution.num_routes(), 1);
/// assert!((solution.total_distance() - 6.0).abs() < 1e-10);
/// ```
pub fn clarke_wright_savings(instance: Arc<Instance>) -> Result<Solution, RoutingError> {
    instance.check_serviceable()?;
    let n = instance.num_customers();
    let mut solution = Solution::new(Arc::clone(&instance));
    if n == 0 {
        return Ok(solution);
    }

    let max_capacity = instance
        .fleet()
        .types()
        .iter()
        .filter(|t| t.count() > 0)
        .map(|t| t.capacity())
        .max()
        .or_else(|| instance.fleet().max_capacity())
        .unwrap_or(0);

    let mut savings = Vec::with_capacity(n * (n - 1) / 2);
    for i in 1..=n {
        for j in (i + 1)..=n {
            let s = instance.distance(DEPOT, i) + instance.distance(DEPOT, j)
                - instance.distance(i, j);
            if s > 0.0 {
                savings.push(Saving { i, j, value: s });
            }
        }
    }
    savings.sort_by(|a, b| b.value.total_cmp(&a.value));

    // route_of[c] = index into `members`; merged-away routes are left empty
    let mut route_of: Vec<usize> = (0..=n).map(|c| c.saturating_sub(1)).collect();
    let mut members: Vec<Vec<usize>> = (1..=n).map(|c| vec![c]).collect();
    let mut merges = 0usize;

    for saving in &savings {
        let ri = route_of[saving.i];
        let rj = route_of[saving.j];
        if ri == rj {
            continue;
        }
        let (a, b) = (&members[ri], &members[rj]);
        if !is_endpoint(a, saving.i) || !is_endpoint(b, saving.j) {
            continue;
        }
        if sequence_load(&instance, a) + sequence_load(&instance, b) > max_capacity {
            continue;
        }

        let Some(merged) = best_orientation(&instance, a, saving.i, b, saving.j) else {
            continue;
        };
        for &c in &merged {
            route_of[c] = ri;
        }
        members[ri] = merged;
        members[rj].clear();
        merges += 1;
    }

    let mut routes: Vec<Vec<usize>> = members.into_iter().filter(|m| !m.is_empty()).collect();
    // heaviest routes pick their vehicles first; ties keep construction order
    routes.sort_by_key(|m| std::cmp::Reverse(sequence_load(&instance, m)));

    let fleet = instance.fleet();
    let mut remaining: Vec<usize> = fleet.types().iter().map(|t| t.count()).collect();
    for route in routes {
        let load = sequence_load(&instance, &route);
        let vehicle_type = fleet
            .cheapest_among(load, |t| remaining[t] > 0)
            .or_else(|| fleet.cheapest_fitting(load))
            .unwrap_or(0);
        remaining[vehicle_type] = remaining[vehicle_type].saturating_sub(1);
        solution.open_route(vehicle_type, route);
    }

    debug!(
        "savings performed {} merges, {} routes remain",
        merges,
        solution.num_routes()
    );
    Ok(solution)
}

fn is_endpoint(route: &[usize], c: usize) -> bool {
    route.first() == Some(&c) || route.last() == Some(&c)
}

/// Joins `a` and `b` with `i` and `j` adjacent, returning the shortest
/// orientation with no time-window lateness.
fn best_orientation(
    instance: &Instance,
    a: &[usize],
    i: usize,
    b: &[usize],
    j: usize,
) -> Option<Vec<usize>> {
    let mut forward: Vec<usize> = Vec::with_capacity(a.len() + b.len());
    // a ends with i, b starts with j
    if a.last() == Some(&i) {
        forward.extend_from_slice(a);
    } else {
        forward.extend(a.iter().rev());
    }
    if b.first() == Some(&j) {
        forward.extend_from_slice(b);
    } else {
        forward.extend(b.iter().rev());
    }
    let backward: Vec<usize> = forward.iter().rev().copied().collect();

    let mut best: Option<(Vec<usize>, f64)> = None;
    for candidate in [forward, backward] {
        if simulate(instance, &candidate).lateness > LATENESS_TOLERANCE {
            continue;
        }
        let d = sequence_distance(instance, &candidate);
        if best.as_ref().map_or(true, |(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(route, _)| route)
}
