//! Distances and travel times.
//!
//! Provides a dense distance matrix and the time-dependent traffic profile
//! used to scale travel times.

mod matrix;
mod traffic;

pub use matrix::DistanceMatrix;
pub use traffic::TrafficProfile;
