//! Mutable route collection for an instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Instance, Route, RouteId};
use crate::constraints::{ConstraintSet, Evaluation};

/// A set of routes serving (some of) the customers of an instance.
///
/// The solution shares its instance read-only and owns its routes. Every
/// edit keeps two invariants: a customer appears at most once, and no route
/// is empty (removing the last customer drops the route).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point, Solution};
///
/// let mut b = InstanceBuilder::new("pair");
/// b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 5)).unwrap();
/// b.add_customer(Customer::new(2, Point::new(2.0, 0.0), 5)).unwrap();
/// b.fleet(Fleet::homogeneous(10, 1));
/// let instance = Arc::new(b.build().unwrap());
///
/// let mut sol = Solution::new(instance);
/// sol.open_route(0, vec![1, 2]);
/// assert_eq!(sol.served_count(), 2);
/// assert!((sol.total_distance() - 4.0).abs() < 1e-10);
///
/// sol.remove_customer(0, 0);
/// sol.remove_customer(0, 0);
/// assert_eq!(sol.num_routes(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    routes: Vec<Route>,
    next_id: u32,
}

impl Solution {
    /// Creates a solution with no routes.
    pub fn new(instance: Arc<Instance>) -> Self {
        Self {
            instance,
            routes: Vec::new(),
            next_id: 0,
        }
    }

    /// The instance this solution belongs to.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// A new handle to the shared instance.
    pub fn shared_instance(&self) -> Arc<Instance> {
        Arc::clone(&self.instance)
    }

    /// Routes in order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn route(&self, index: usize) -> &Route {
        &self.routes[index]
    }

    /// Number of routes.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Current position of the route with the given id.
    pub fn route_index(&self, id: RouteId) -> Option<usize> {
        self.routes.iter().position(|r| r.id() == id)
    }

    /// Appends a new route and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `customers` is empty or names a customer that is already
    /// routed.
    pub fn open_route(&mut self, vehicle_type: usize, customers: Vec<usize>) -> RouteId {
        let mut routed = self.routed_flags();
        for &c in &customers {
            assert!(!routed[c], "customer {c} is already routed");
            routed[c] = true;
        }
        let at = self.routes.len();
        self.insert_route(at, None, vehicle_type, customers)
    }

    /// Inserts a route at position `index`, reusing `id` when given.
    pub(crate) fn insert_route(
        &mut self,
        index: usize,
        id: Option<RouteId>,
        vehicle_type: usize,
        customers: Vec<usize>,
    ) -> RouteId {
        assert!(!customers.is_empty(), "routes must serve at least one customer");
        debug_assert!(customers.iter().all(|&c| self.route_of(c).is_none()));
        let id = id.unwrap_or_else(|| {
            let id = RouteId(self.next_id);
            self.next_id += 1;
            id
        });
        let route = Route::new(id, vehicle_type, customers, &self.instance);
        self.routes.insert(index, route);
        id
    }

    /// Inserts `customer` into route `route` before position `index`.
    pub fn insert_customer(&mut self, route: usize, index: usize, customer: usize) {
        debug_assert!(self.route_of(customer).is_none(), "customer {customer} is already routed");
        let r = &mut self.routes[route];
        r.customers_mut().insert(index, customer);
        r.refresh(&self.instance);
    }

    /// Removes and returns the customer at `index` of route `route`.
    ///
    /// The route is dropped if it becomes empty; later routes shift down.
    pub fn remove_customer(&mut self, route: usize, index: usize) -> usize {
        let r = &mut self.routes[route];
        let customer = r.customers_mut().remove(index);
        if r.is_empty() {
            self.routes.remove(route);
        } else {
            r.refresh(&self.instance);
        }
        customer
    }

    /// Exchanges the customers at two `(route, index)` positions.
    pub fn swap_customers(&mut self, a: (usize, usize), b: (usize, usize)) {
        if a.0 == b.0 {
            let r = &mut self.routes[a.0];
            r.customers_mut().swap(a.1, b.1);
            r.refresh(&self.instance);
            return;
        }
        let ca = self.routes[a.0].customers()[a.1];
        let cb = self.routes[b.0].customers()[b.1];
        self.routes[a.0].customers_mut()[a.1] = cb;
        self.routes[b.0].customers_mut()[b.1] = ca;
        self.routes[a.0].refresh(&self.instance);
        self.routes[b.0].refresh(&self.instance);
    }

    /// Reverses positions `start..=end` of route `route`.
    pub fn reverse_segment(&mut self, route: usize, start: usize, end: usize) {
        let r = &mut self.routes[route];
        r.customers_mut()[start..=end].reverse();
        r.refresh(&self.instance);
    }

    /// Position `(route, index)` of a customer, if served.
    pub fn route_of(&self, customer: usize) -> Option<(usize, usize)> {
        self.routes.iter().enumerate().find_map(|(ri, r)| {
            r.customers()
                .iter()
                .position(|&c| c == customer)
                .map(|pos| (ri, pos))
        })
    }

    /// Number of customers on some route.
    pub fn served_count(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }

    fn routed_flags(&self) -> Vec<bool> {
        let mut routed = vec![false; self.instance.num_customers() + 1];
        for r in &self.routes {
            for &c in r.customers() {
                routed[c] = true;
            }
        }
        routed
    }

    /// Customers (location indices) not on any route.
    pub fn unserved(&self) -> Vec<usize> {
        let routed = self.routed_flags();
        self.instance
            .customer_locations()
            .filter(|&c| !routed[c])
            .collect()
    }

    /// Route stops beyond the first visit of each customer. Zero for any
    /// solution built through the public edits.
    pub fn duplicate_count(&self) -> usize {
        let distinct = self.routed_flags().iter().filter(|&&r| r).count();
        self.served_count() - distinct
    }

    #[cfg(test)]
    pub(crate) fn push_route_unchecked(&mut self, vehicle_type: usize, customers: Vec<usize>) {
        let id = RouteId(self.next_id);
        self.next_id += 1;
        let route = Route::new(id, vehicle_type, customers, &self.instance);
        self.routes.push(route);
    }

    /// Number of routes per vehicle type, indexed like the fleet.
    ///
    /// Routes with an unknown vehicle type are not counted.
    pub fn vehicles_used(&self) -> Vec<usize> {
        let mut used = vec![0; self.instance.fleet().len()];
        for r in &self.routes {
            if let Some(slot) = used.get_mut(r.vehicle_type()) {
                *slot += 1;
            }
        }
        used
    }

    /// Sum of route distances.
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().map(Route::distance).sum()
    }

    /// Sum of route distances weighted by vehicle cost multipliers.
    pub fn total_cost(&self) -> f64 {
        self.routes.iter().map(|r| r.cost(&self.instance)).sum()
    }

    /// Runs the constraint set over this solution.
    pub fn evaluate(&self, constraints: &ConstraintSet) -> Evaluation {
        constraints.evaluate(self)
    }

    /// Serializable snapshot using external customer ids.
    pub fn summary(&self, constraints: &ConstraintSet) -> SolutionSummary {
        let instance = &self.instance;
        let evaluation = self.evaluate(constraints);
        let routes = self
            .routes
            .iter()
            .map(|r| RouteSummary {
                id: r.id().value(),
                vehicle_type: instance
                    .fleet()
                    .get(r.vehicle_type())
                    .map_or_else(|| format!("#{}", r.vehicle_type()), |t| t.name().to_string()),
                customers: r.customers().iter().map(|&c| instance.customer(c).id()).collect(),
                distance: r.distance(),
                load: r.load(),
                cost: r.cost(instance),
            })
            .collect();
        SolutionSummary {
            instance: instance.name().to_string(),
            routes,
            total_distance: evaluation.distance,
            total_cost: evaluation.cost,
            objective: evaluation.objective,
            violation: evaluation.violation,
            feasible: evaluation.feasible,
            unserved: self
                .unserved()
                .into_iter()
                .map(|c| instance.customer(c).id())
                .collect(),
        }
    }
}

/// One route of a [`SolutionSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Route id.
    pub id: u32,
    /// Vehicle type name.
    pub vehicle_type: String,
    /// External customer ids in visiting order.
    pub customers: Vec<usize>,
    /// Depot-to-depot distance.
    pub distance: f64,
    /// Total demand.
    pub load: i32,
    /// Distance times cost multiplier.
    pub cost: f64,
}

/// Serializable snapshot of a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    /// Instance name.
    pub instance: String,
    /// Routes.
    pub routes: Vec<RouteSummary>,
    /// Sum of route distances.
    pub total_distance: f64,
    /// Sum of route costs.
    pub total_cost: f64,
    /// Cost plus weighted violation.
    pub objective: f64,
    /// Total violation amount.
    pub violation: f64,
    /// Whether every constraint holds.
    pub feasible: bool,
    /// External ids of customers on no route.
    pub unserved: Vec<usize>,
}
