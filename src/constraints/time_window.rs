//! Time windows.

use super::{Constraint, Validation};
use crate::models::{Instance, Route, DEPOT};

/// Timing of a route simulated from depot departure at time 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Arrival time at each customer.
    pub arrivals: Vec<f64>,
    /// Sum of lateness over all customers.
    pub lateness: f64,
    /// Arrival time back at the depot.
    pub return_time: f64,
}

/// Simulates a customer sequence.
///
/// Travel time follows the instance's traffic profile at the departure time
/// of each leg. A vehicle arriving early waits for the window to open; a
/// late arrival is served on arrival and accumulates lateness. Service
/// duration is spent before leaving for the next stop.
pub fn simulate(instance: &Instance, customers: &[usize]) -> Schedule {
    let mut arrivals = Vec::with_capacity(customers.len());
    let mut lateness = 0.0;
    let mut time = 0.0;
    let mut prev = DEPOT;

    for &c in customers {
        let arrival = time + instance.travel_time(prev, c, time);
        arrivals.push(arrival);
        let start = match instance.time_window(c) {
            Some(tw) => {
                lateness += tw.lateness(arrival);
                arrival + tw.waiting_time(arrival)
            }
            None => arrival,
        };
        time = start + instance.service_duration(c);
        prev = c;
    }

    let return_time = if prev == DEPOT {
        0.0
    } else {
        time + instance.travel_time(prev, DEPOT, time)
    };
    Schedule {
        arrivals,
        lateness,
        return_time,
    }
}

/// Every customer must be reached no later than its window closes.
///
/// Violation is the total lateness along the route.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindowConstraint;

impl Constraint for TimeWindowConstraint {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn validate_route(&self, route: &Route, instance: &Instance) -> Validation {
        Validation::violated(simulate(instance, route.customers()).lateness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::TrafficProfile;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, TimeWindow};

    fn tw(a: f64, b: f64) -> TimeWindow {
        TimeWindow::new(a, b).expect("valid")
    }

    fn instance(traffic: TrafficProfile) -> Instance {
        let mut b = InstanceBuilder::new("tw");
        b.add_customer(
            Customer::new(1, Point::new(5.0, 0.0), 1)
                .with_time_window(tw(8.0, 20.0))
                .with_service_duration(2.0),
        )
        .expect("ok");
        b.add_customer(Customer::new(2, Point::new(10.0, 0.0), 1).with_time_window(tw(0.0, 12.0)))
            .expect("ok");
        b.fleet(Fleet::homogeneous(10, 1)).traffic(traffic);
        b.build().expect("valid")
    }

    #[test]
    fn test_wait_then_serve() {
        let inst = instance(TrafficProfile::identity());
        let s = simulate(&inst, &[1, 2]);
        // arrive 5, wait to 8, serve to 10, arrive 15 at customer 2
        assert_eq!(s.arrivals, vec![5.0, 15.0]);
        assert!((s.lateness - 3.0).abs() < 1e-10);
        assert!((s.return_time - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_other_order_on_time() {
        let inst = instance(TrafficProfile::identity());
        let s = simulate(&inst, &[2, 1]);
        assert_eq!(s.lateness, 0.0);
        let v = Validation::violated(s.lateness);
        assert!(v.feasible);
    }

    #[test]
    fn test_traffic_slows_travel() {
        let slow = TrafficProfile::new(100.0, vec![2.0]).expect("valid");
        let inst = instance(slow);
        let s = simulate(&inst, &[2]);
        assert!((s.arrivals[0] - 20.0).abs() < 1e-10);
        assert!((s.lateness - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_sequence() {
        let inst = instance(TrafficProfile::identity());
        let s = simulate(&inst, &[]);
        assert!(s.arrivals.is_empty());
        assert_eq!(s.return_time, 0.0);
    }
}
