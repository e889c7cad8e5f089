//! Domain model types for heterogeneous-fleet vehicle routing.
//!
//! Provides customers with demands and time windows, vehicle types grouped
//! into a fleet, the immutable [`Instance`], and the mutable [`Solution`]
//! made of [`Route`]s.

mod customer;
mod instance;
mod route;
mod solution;
mod vehicle;

pub use customer::{Customer, Point, TimeWindow};
pub use instance::{CustomerSpec, Instance, InstanceBuilder, InstanceSpec, DEPOT};
pub use route::{sequence_distance, sequence_load, Route, RouteId};
pub use solution::{RouteSummary, Solution, SolutionSummary};
pub use vehicle::{Fleet, VehicleType};
