//! Vehicle types and heterogeneous fleets.

use serde::{Deserialize, Serialize};

/// A kind of vehicle available in some quantity.
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::VehicleType;
///
/// let van = VehicleType::new("van", 40, 3).with_cost_per_distance(0.8);
/// assert_eq!(van.capacity(), 40);
/// assert_eq!(van.count(), 3);
/// assert_eq!(van.cost_per_distance(), 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    name: String,
    capacity: i32,
    #[serde(default = "default_cost_per_distance")]
    cost_per_distance: f64,
    count: usize,
}

fn default_cost_per_distance() -> f64 {
    1.0
}

impl VehicleType {
    /// Creates a vehicle type with cost multiplier 1.0.
    pub fn new(name: impl Into<String>, capacity: i32, count: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            cost_per_distance: 1.0,
            count,
        }
    }

    /// Sets the cost-per-distance multiplier.
    pub fn with_cost_per_distance(mut self, cost: f64) -> Self {
        self.cost_per_distance = cost;
        self
    }

    /// Identifier of this type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum load.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Multiplier applied to route distance.
    pub fn cost_per_distance(&self) -> f64 {
        self.cost_per_distance
    }

    /// Number of vehicles of this type.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// An ordered collection of vehicle types. Routes refer to types by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    types: Vec<VehicleType>,
}

impl Fleet {
    /// Creates a fleet from vehicle types.
    pub fn new(types: Vec<VehicleType>) -> Self {
        Self { types }
    }

    /// A homogeneous fleet of `count` vehicles with the given capacity.
    pub fn homogeneous(capacity: i32, count: usize) -> Self {
        Self::new(vec![VehicleType::new("standard", capacity, count)])
    }

    /// Vehicle types in fleet order.
    pub fn types(&self) -> &[VehicleType] {
        &self.types
    }

    /// Vehicle type at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&VehicleType> {
        self.types.get(index)
    }

    /// Number of vehicle types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if there are no vehicle types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total number of vehicles over all types.
    pub fn total_vehicles(&self) -> usize {
        self.types.iter().map(|t| t.count).sum()
    }

    /// Largest single-vehicle capacity, or `None` for an empty fleet.
    pub fn max_capacity(&self) -> Option<i32> {
        self.types.iter().map(|t| t.capacity).max()
    }

    /// Index of the type with the largest capacity. Ties go to the earlier type.
    pub fn largest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, t) in self.types.iter().enumerate() {
            if best.map_or(true, |b| t.capacity > self.types[b].capacity) {
                best = Some(idx);
            }
        }
        best
    }

    /// Index of the cheapest type able to carry `load`.
    ///
    /// Orders by cost multiplier, then capacity, then fleet order.
    pub fn cheapest_fitting(&self, load: i32) -> Option<usize> {
        self.cheapest_among(load, |_| true)
    }

    /// Like [`cheapest_fitting`](Self::cheapest_fitting) but restricted to
    /// types accepted by `allowed`.
    pub fn cheapest_among(&self, load: i32, allowed: impl Fn(usize) -> bool) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, t) in self.types.iter().enumerate() {
            if t.capacity < load || !allowed(idx) {
                continue;
            }
            let better = best.map_or(true, |b| {
                let cur = &self.types[b];
                t.cost_per_distance < cur.cost_per_distance
                    || (t.cost_per_distance == cur.cost_per_distance && t.capacity < cur.capacity)
            });
            if better {
                best = Some(idx);
            }
        }
        best
    }
}
