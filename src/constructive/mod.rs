//! Constructive heuristics for building initial solutions.
//!
//! - [`nearest_neighbor`] — Greedy nearest-neighbor appending, O(n²)
//! - [`clarke_wright_savings`] — Clarke-Wright savings algorithm (1964), O(n² log n)
//!
//! Both check at entry that every customer fits some vehicle type and fail
//! with [`RoutingError::Infeasible`](crate::error::RoutingError::Infeasible)
//! otherwise.

mod clarke_wright;
mod nearest_neighbor;

pub use clarke_wright::clarke_wright_savings;
pub use nearest_neighbor::nearest_neighbor;
