//! Immutable problem instance and its builder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Customer, Fleet, Point, TimeWindow};
use crate::distance::{DistanceMatrix, TrafficProfile};
use crate::error::{InfeasibleKind, RoutingError};

/// Location index of the depot. Customers occupy `1..=num_customers`.
pub const DEPOT: usize = 0;

const METRIC_TOLERANCE: f64 = 1e-9;

type Metric = Box<dyn Fn(&Point, &Point) -> f64>;

/// A routing problem: depot, customers, fleet, distances, traffic.
///
/// Instances are immutable once built and are shared between solutions
/// through `Arc<Instance>`.
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
///
/// let mut builder = InstanceBuilder::new("cross");
/// builder.depot(Point::new(0.0, 0.0));
/// builder.add_customer(Customer::new(1, Point::new(1.0, 0.0), 10)).unwrap();
/// builder.add_customer(Customer::new(2, Point::new(0.0, 1.0), 10)).unwrap();
/// builder.fleet(Fleet::homogeneous(40, 2));
/// let instance = builder.build().unwrap();
///
/// assert_eq!(instance.num_customers(), 2);
/// assert_eq!(instance.location_of(2), Some(2));
/// assert!((instance.distance(0, 1) - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    depot: Point,
    customers: Vec<Customer>,
    locations: HashMap<usize, usize>,
    fleet: Fleet,
    distances: DistanceMatrix,
    traffic: TrafficProfile,
}

impl Instance {
    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Depot coordinate.
    pub fn depot(&self) -> Point {
        self.depot
    }

    /// Customers in insertion order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Number of customers (depot excluded).
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Customer at location index `loc` (`1..=num_customers`).
    ///
    /// # Panics
    ///
    /// Panics if `loc` is the depot or out of range.
    pub fn customer(&self, loc: usize) -> &Customer {
        &self.customers[loc - 1]
    }

    /// Location index of the customer with external id `id`.
    pub fn location_of(&self, id: usize) -> Option<usize> {
        self.locations.get(&id).copied()
    }

    /// Location indices of all customers, in insertion order.
    pub fn customer_locations(&self) -> impl Iterator<Item = usize> {
        1..=self.customers.len()
    }

    /// Demand at a location (zero at the depot).
    pub fn demand(&self, loc: usize) -> i32 {
        if loc == DEPOT {
            0
        } else {
            self.customer(loc).demand()
        }
    }

    /// Service duration at a location (zero at the depot).
    pub fn service_duration(&self, loc: usize) -> f64 {
        if loc == DEPOT {
            0.0
        } else {
            self.customer(loc).service_duration()
        }
    }

    /// Time window at a location (never at the depot).
    pub fn time_window(&self, loc: usize) -> Option<&TimeWindow> {
        if loc == DEPOT {
            None
        } else {
            self.customer(loc).time_window()
        }
    }

    /// The fleet.
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// The distance matrix.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Distance between two locations.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// Travel time between two locations when departing at `departure`.
    ///
    /// Unit speed scaled by the traffic multiplier for the departure slot.
    pub fn travel_time(&self, from: usize, to: usize, departure: f64) -> f64 {
        self.distances.get(from, to) * self.traffic.factor_at(departure)
    }

    /// The traffic multiplier table.
    pub fn traffic(&self) -> &TrafficProfile {
        &self.traffic
    }

    /// Total demand over all customers.
    pub fn total_demand(&self) -> i64 {
        self.customers.iter().map(|c| c.demand() as i64).sum()
    }

    /// Verifies that every customer fits in at least one vehicle type.
    pub fn check_serviceable(&self) -> Result<(), RoutingError> {
        let Some(max_capacity) = self.fleet.max_capacity() else {
            if self.customers.is_empty() {
                return Ok(());
            }
            return Err(RoutingError::Infeasible(InfeasibleKind::EmptyFleet));
        };
        match self.customers.iter().find(|c| c.demand() > max_capacity) {
            Some(c) => Err(RoutingError::Infeasible(
                InfeasibleKind::UnassignableCustomer {
                    customer: c.id(),
                    demand: c.demand(),
                    max_capacity,
                },
            )),
            None => Ok(()),
        }
    }
}

/// Incremental constructor for [`Instance`].
///
/// Customer-level problems are reported as soon as the customer is added;
/// fleet, metric and traffic problems are reported by [`build`](Self::build).
pub struct InstanceBuilder {
    name: String,
    depot: Point,
    customers: Vec<Customer>,
    locations: HashMap<usize, usize>,
    fleet: Fleet,
    metric: Option<Metric>,
    matrix: Option<DistanceMatrix>,
    traffic: TrafficProfile,
}

impl InstanceBuilder {
    /// Starts an instance with the depot at the origin and an empty fleet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depot: Point::new(0.0, 0.0),
            customers: Vec::new(),
            locations: HashMap::new(),
            fleet: Fleet::default(),
            metric: None,
            matrix: None,
            traffic: TrafficProfile::identity(),
        }
    }

    /// Sets the depot coordinate.
    pub fn depot(&mut self, depot: Point) -> &mut Self {
        self.depot = depot;
        self
    }

    /// Adds a customer.
    ///
    /// Fails with [`RoutingError::InvalidInstance`] on a duplicate id, a
    /// negative demand, or a negative or non-finite service duration.
    pub fn add_customer(&mut self, customer: Customer) -> Result<&mut Self, RoutingError> {
        if self.locations.contains_key(&customer.id()) {
            return Err(RoutingError::InvalidInstance(format!(
                "duplicate customer id {}",
                customer.id()
            )));
        }
        if customer.demand() < 0 {
            return Err(RoutingError::InvalidInstance(format!(
                "customer {} has negative demand {}",
                customer.id(),
                customer.demand()
            )));
        }
        let service = customer.service_duration();
        if !service.is_finite() || service < 0.0 {
            return Err(RoutingError::InvalidInstance(format!(
                "customer {} has invalid service duration {service}",
                customer.id()
            )));
        }
        self.locations
            .insert(customer.id(), self.customers.len() + 1);
        self.customers.push(customer);
        Ok(self)
    }

    /// Sets the fleet.
    pub fn fleet(&mut self, fleet: Fleet) -> &mut Self {
        self.fleet = fleet;
        self
    }

    /// Replaces the Euclidean metric with `metric`.
    pub fn distance_fn<F>(&mut self, metric: F) -> &mut Self
    where
        F: Fn(&Point, &Point) -> f64 + 'static,
    {
        self.metric = Some(Box::new(metric));
        self.matrix = None;
        self
    }

    /// Supplies an explicit matrix (depot = 0, customers in insertion order).
    pub fn distance_matrix(&mut self, matrix: DistanceMatrix) -> &mut Self {
        self.matrix = Some(matrix);
        self.metric = None;
        self
    }

    /// Sets the traffic multiplier table.
    pub fn traffic(&mut self, traffic: TrafficProfile) -> &mut Self {
        self.traffic = traffic;
        self
    }

    /// Validates the fleet, metric and traffic table and freezes the instance.
    pub fn build(self) -> Result<Instance, RoutingError> {
        let mut names = std::collections::HashSet::new();
        for t in self.fleet.types() {
            if !names.insert(t.name()) {
                return Err(RoutingError::InvalidInstance(format!(
                    "duplicate vehicle type '{}'",
                    t.name()
                )));
            }
            if t.capacity() <= 0 {
                return Err(RoutingError::InvalidInstance(format!(
                    "vehicle type '{}' has non-positive capacity {}",
                    t.name(),
                    t.capacity()
                )));
            }
            let mult = t.cost_per_distance();
            if !mult.is_finite() || mult <= 0.0 {
                return Err(RoutingError::InvalidInstance(format!(
                    "vehicle type '{}' has invalid cost multiplier {mult}",
                    t.name()
                )));
            }
        }

        let total_demand: i64 = self.customers.iter().map(|c| i64::from(c.demand())).sum();
        if total_demand > i64::from(i32::MAX) {
            return Err(RoutingError::InvalidInstance(format!(
                "total demand {total_demand} exceeds {}",
                i32::MAX
            )));
        }

        let traffic = TrafficProfile::new(
            self.traffic.slot_duration(),
            self.traffic.factors().to_vec(),
        )
        .ok_or_else(|| RoutingError::InvalidInstance("invalid traffic profile".into()))?;

        let mut points = Vec::with_capacity(self.customers.len() + 1);
        points.push(self.depot);
        points.extend(self.customers.iter().map(|c| c.location()));

        let distances = match (self.matrix, self.metric) {
            (Some(m), _) => {
                if m.size() != points.len() {
                    return Err(RoutingError::InvalidInstance(format!(
                        "distance matrix has size {} but instance has {} locations",
                        m.size(),
                        points.len()
                    )));
                }
                m
            }
            (None, Some(metric)) => DistanceMatrix::from_fn(&points, metric),
            (None, None) => DistanceMatrix::from_points(&points),
        };
        distances
            .check_metric(METRIC_TOLERANCE)
            .map_err(RoutingError::InvalidInstance)?;

        Ok(Instance {
            name: self.name,
            depot: self.depot,
            customers: self.customers,
            locations: self.locations,
            fleet: self.fleet,
            distances,
            traffic,
        })
    }
}

/// Serializable description of a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSpec {
    /// External id.
    pub id: usize,
    /// X-coordinate.
    pub x: f64,
    /// Y-coordinate.
    pub y: f64,
    /// Demand.
    pub demand: i32,
    /// `[early, late]`, if constrained.
    #[serde(default)]
    pub time_window: Option<[f64; 2]>,
    /// Service duration.
    #[serde(default)]
    pub service_duration: f64,
}

/// Serializable description of an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Instance name.
    pub name: String,
    /// Depot coordinate.
    pub depot: Point,
    /// Customers.
    pub customers: Vec<CustomerSpec>,
    /// Fleet.
    pub fleet: Fleet,
    /// Traffic table; identity when absent.
    #[serde(default)]
    pub traffic: Option<TrafficProfile>,
}

impl TryFrom<InstanceSpec> for Instance {
    type Error = RoutingError;

    fn try_from(spec: InstanceSpec) -> Result<Self, Self::Error> {
        let mut builder = InstanceBuilder::new(spec.name);
        builder.depot(spec.depot).fleet(spec.fleet);
        if let Some(traffic) = spec.traffic {
            builder.traffic(traffic);
        }
        for c in spec.customers {
            let mut customer = Customer::new(c.id, Point::new(c.x, c.y), c.demand)
                .with_service_duration(c.service_duration);
            if let Some([early, late]) = c.time_window {
                let tw = TimeWindow::new(early, late).ok_or_else(|| {
                    RoutingError::InvalidInstance(format!(
                        "customer {} has invalid time window [{early}, {late}]",
                        c.id
                    ))
                })?;
                customer = customer.with_time_window(tw);
            }
            builder.add_customer(customer)?;
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleType;

    fn builder() -> InstanceBuilder {
        let mut b = InstanceBuilder::new("t");
        b.depot(Point::new(0.0, 0.0)).fleet(Fleet::homogeneous(30, 2));
        b
    }

    #[test]
    fn test_duplicate_customer_rejected() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 5))
            .expect("first");
        let err = b
            .add_customer(Customer::new(1, Point::new(2.0, 0.0), 5))
            .err()
            .expect("duplicate");
        assert!(matches!(err, RoutingError::InvalidInstance(_)));
    }

    #[test]
    fn test_negative_demand_rejected() {
        let mut b = builder();
        let err = b
            .add_customer(Customer::new(1, Point::new(1.0, 0.0), -3))
            .err()
            .expect("negative");
        assert!(matches!(err, RoutingError::InvalidInstance(_)));
    }

    #[test]
    fn test_total_demand_bounded() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), i32::MAX))
            .expect("ok");
        b.add_customer(Customer::new(2, Point::new(2.0, 0.0), 1))
            .expect("ok");
        assert!(matches!(b.build(), Err(RoutingError::InvalidInstance(_))));

        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), i32::MAX))
            .expect("ok");
        assert!(b.build().is_ok());
    }

    #[test]
    fn test_locations_follow_insertion_order() {
        let mut b = builder();
        b.add_customer(Customer::new(42, Point::new(1.0, 0.0), 5))
            .expect("ok");
        b.add_customer(Customer::new(7, Point::new(2.0, 0.0), 5))
            .expect("ok");
        let inst = b.build().expect("valid");
        assert_eq!(inst.location_of(42), Some(1));
        assert_eq!(inst.location_of(7), Some(2));
        assert_eq!(inst.customer(2).id(), 7);
        assert_eq!(inst.demand(DEPOT), 0);
        assert_eq!(inst.location_of(99), None);
    }

    #[test]
    fn test_custom_metric() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(3.0, 4.0), 5))
            .expect("ok");
        b.distance_fn(|a, c| (a.x - c.x).abs() + (a.y - c.y).abs());
        let inst = b.build().expect("valid");
        assert!((inst.distance(0, 1) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_explicit_matrix_size_checked() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(3.0, 4.0), 5))
            .expect("ok");
        b.distance_matrix(DistanceMatrix::new(3));
        assert!(matches!(b.build(), Err(RoutingError::InvalidInstance(_))));
    }

    #[test]
    fn test_asymmetric_metric_rejected() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(3.0, 4.0), 5))
            .expect("ok");
        let dm = DistanceMatrix::from_data(2, vec![0.0, 5.0, 6.0, 0.0]).expect("size");
        b.distance_matrix(dm);
        assert!(matches!(b.build(), Err(RoutingError::InvalidInstance(_))));
    }

    #[test]
    fn test_bad_vehicle_type_rejected() {
        let mut b = builder();
        b.fleet(Fleet::new(vec![VehicleType::new("zero", 0, 1)]));
        assert!(matches!(b.build(), Err(RoutingError::InvalidInstance(_))));

        let mut b = builder();
        b.fleet(Fleet::new(vec![
            VehicleType::new("van", 10, 1),
            VehicleType::new("van", 20, 1),
        ]));
        assert!(matches!(b.build(), Err(RoutingError::InvalidInstance(_))));
    }

    #[test]
    fn test_check_serviceable() {
        let mut b = builder();
        b.add_customer(Customer::new(9, Point::new(1.0, 0.0), 31))
            .expect("ok");
        let inst = b.build().expect("valid");
        assert_eq!(
            inst.check_serviceable(),
            Err(RoutingError::Infeasible(
                InfeasibleKind::UnassignableCustomer {
                    customer: 9,
                    demand: 31,
                    max_capacity: 30,
                }
            ))
        );
    }

    #[test]
    fn test_empty_fleet_unserviceable() {
        let mut b = InstanceBuilder::new("no-fleet");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 1))
            .expect("ok");
        let inst = b.build().expect("well-formed");
        assert_eq!(
            inst.check_serviceable(),
            Err(RoutingError::Infeasible(InfeasibleKind::EmptyFleet))
        );
    }

    #[test]
    fn test_travel_time_uses_traffic() {
        let mut b = builder();
        b.add_customer(Customer::new(1, Point::new(10.0, 0.0), 5))
            .expect("ok");
        b.traffic(TrafficProfile::new(5.0, vec![1.0, 2.0]).expect("valid"));
        let inst = b.build().expect("valid");
        assert!((inst.travel_time(0, 1, 0.0) - 10.0).abs() < 1e-10);
        assert!((inst.travel_time(0, 1, 6.0) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_instance_spec_json() {
        let json = r#"{
            "name": "json",
            "depot": {"x": 0.0, "y": 0.0},
            "customers": [
                {"id": 1, "x": 1.0, "y": 0.0, "demand": 4, "time_window": [0.0, 10.0]},
                {"id": 2, "x": 0.0, "y": 2.0, "demand": 6, "service_duration": 1.5}
            ],
            "fleet": [{"name": "van", "capacity": 10, "count": 1}]
        }"#;
        let spec: InstanceSpec = serde_json::from_str(json).expect("parse");
        let inst = Instance::try_from(spec).expect("valid");
        assert_eq!(inst.num_customers(), 2);
        assert_eq!(inst.fleet().len(), 1);
        assert!(inst.time_window(1).is_some());
        assert_eq!(inst.service_duration(2), 1.5);
        assert!(inst.traffic().is_identity());
    }

    #[test]
    fn test_instance_spec_bad_window() {
        let spec = InstanceSpec {
            name: "bad".into(),
            depot: Point::new(0.0, 0.0),
            customers: vec![CustomerSpec {
                id: 1,
                x: 1.0,
                y: 1.0,
                demand: 1,
                time_window: Some([9.0, 8.0]),
                service_duration: 0.0,
            }],
            fleet: Fleet::homogeneous(10, 1),
            traffic: None,
        };
        assert!(matches!(
            Instance::try_from(spec),
            Err(RoutingError::InvalidInstance(_))
        ));
    }
}
