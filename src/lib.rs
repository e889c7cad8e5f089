//! # u-ecoroute
//!
//! Heterogeneous-fleet vehicle routing with capacities, time windows and
//! time-dependent travel, solved by construction heuristics and
//! penalty-based metaheuristics.
//!
//! ## Modules
//!
//! - [`models`] — Instance, customers, vehicle types, routes and solutions
//! - [`distance`] — Distance matrix and traffic multiplier profiles
//! - [`constraints`] — Pluggable validators and the penalized objective
//! - [`constructive`] — Nearest neighbor and Clarke-Wright savings
//! - [`local_search`] — Moves, simulated annealing and tabu search
//! - [`solver`] — Algorithm selection, parameters, multi-start runs
//! - [`benchmark`] — CVRPLIB reader, reference optima and gap statistics
//! - [`impact`] — Distance and CO₂ savings against a baseline
//! - [`alns`] — Destroy/repair operator interfaces
//!
//! ## Quick start
//!
//! ```
//! use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point, VehicleType};
//! use u_ecoroute::solver::{Algorithm, Solver, SolverParams};
//!
//! let mut b = InstanceBuilder::new("demo");
//! for i in 0..10 {
//!     let a = i as f64 * std::f64::consts::TAU / 10.0;
//!     b.add_customer(Customer::new(i + 1, Point::new(20.0 * a.cos(), 20.0 * a.sin()), 6)).unwrap();
//! }
//! b.fleet(Fleet::new(vec![
//!     VehicleType::new("van", 20, 2),
//!     VehicleType::new("truck", 40, 1).with_cost_per_distance(1.5),
//! ]));
//! let solver = Solver::new(b.build().unwrap());
//!
//! let params = SolverParams::default().with_random_seed(42).with_max_iterations(200);
//! let outcome = solver.solve(Algorithm::TabuSearch, &params).unwrap();
//! assert!(outcome.feasible());
//! assert_eq!(outcome.solution.served_count(), 10);
//! ```

pub mod alns;
pub mod benchmark;
pub mod constraints;
pub mod constructive;
pub mod distance;
pub mod error;
pub mod impact;
pub mod local_search;
pub mod models;
pub mod solver;
