//! Benchmarking against published reference instances.
//!
//! A [`BenchmarkSuite`] maps instance names to an instance and an optional
//! optimal cost. Running it repeats each solve several times and reports
//! cost statistics and the optimality gap
//!
//! ```text
//! gap = (cost - optimum) / optimum * 100
//! ```
//!
//! Instances are loaded from CVRPLIB files with [`vrplib::load`]; none are
//! generated.

pub mod vrplib;

use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::error::RoutingError;
use crate::models::Instance;
use crate::solver::{Algorithm, SolveOutcome, Solver, SolverParams};

const KNOWN_OPTIMA: [(&str, f64); 10] = [
    ("A-n32-k5", 784.0),
    ("A-n33-k5", 661.0),
    ("A-n34-k5", 778.0),
    ("A-n36-k5", 799.0),
    ("A-n37-k5", 669.0),
    ("A-n38-k5", 730.0),
    ("A-n39-k5", 822.0),
    ("A-n45-k6", 944.0),
    ("A-n48-k7", 1073.0),
    ("A-n54-k7", 1167.0),
];

/// Published optimal cost of a named Augerat instance.
///
/// # Examples
///
/// ```
/// use u_ecoroute::benchmark::known_optimum;
///
/// assert_eq!(known_optimum("A-n32-k5"), Some(784.0));
/// assert_eq!(known_optimum("B-n31-k5"), None);
/// ```
pub fn known_optimum(name: &str) -> Option<f64> {
    KNOWN_OPTIMA
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, cost)| cost)
}

/// Percentage gap of `cost` above `optimum`; `None` for a non-positive
/// optimum.
pub fn gap(cost: f64, optimum: f64) -> Option<f64> {
    (optimum > 0.0).then(|| (cost - optimum) / optimum * 100.0)
}

/// Aggregated results of repeated runs on one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    /// Instance name.
    pub instance: String,
    /// Algorithm selector name.
    pub algorithm: String,
    /// Reference optimum, when known.
    pub optimum: Option<f64>,
    /// Cost of each run.
    pub costs: Vec<f64>,
    /// Wall-clock seconds of each run.
    pub times: Vec<f64>,
    /// Mean cost.
    pub avg_cost: f64,
    /// Lowest cost.
    pub min_cost: f64,
    /// Highest cost.
    pub max_cost: f64,
    /// Population standard deviation of the cost.
    pub std_cost: f64,
    /// Mean wall-clock seconds.
    pub avg_time: f64,
    /// Gap of the mean cost.
    pub avg_gap: Option<f64>,
    /// Gap of the lowest cost.
    pub best_gap: Option<f64>,
    /// Fraction of runs that returned a feasible solution.
    pub feasible_rate: f64,
}

impl BenchmarkRecord {
    /// Summarizes `outcomes`, all from one instance and algorithm.
    ///
    /// The cost of a run is its route cost without penalties.
    pub fn from_outcomes(
        instance: impl Into<String>,
        algorithm: Algorithm,
        optimum: Option<f64>,
        outcomes: &[SolveOutcome],
    ) -> Self {
        let costs: Vec<f64> = outcomes.iter().map(|o| o.evaluation.cost).collect();
        let times: Vec<f64> = outcomes.iter().map(|o| o.elapsed.as_secs_f64()).collect();
        let n = costs.len().max(1) as f64;

        let avg_cost = costs.iter().sum::<f64>() / n;
        let min_cost = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_cost = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = costs.iter().map(|c| (c - avg_cost).powi(2)).sum::<f64>() / n;
        let feasible = outcomes.iter().filter(|o| o.feasible()).count();

        Self {
            instance: instance.into(),
            algorithm: algorithm.to_string(),
            optimum,
            avg_gap: optimum.and_then(|opt| gap(avg_cost, opt)),
            best_gap: optimum.and_then(|opt| gap(min_cost, opt)),
            avg_time: times.iter().sum::<f64>() / n,
            feasible_rate: feasible as f64 / n,
            std_cost: variance.sqrt(),
            costs,
            times,
            avg_cost,
            min_cost,
            max_cost,
        }
    }
}

/// Named instances with reference optima.
///
/// # Examples
///
/// ```
/// use u_ecoroute::benchmark::BenchmarkSuite;
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
/// use u_ecoroute::solver::{Algorithm, SolverParams};
///
/// let mut b = InstanceBuilder::new("pair");
/// b.add_customer(Customer::new(1, Point::new(3.0, 4.0), 2)).unwrap();
/// b.add_customer(Customer::new(2, Point::new(-3.0, 4.0), 2)).unwrap();
/// b.fleet(Fleet::homogeneous(10, 1));
///
/// let mut suite = BenchmarkSuite::new();
/// suite.add(b.build().unwrap(), Some(16.0));
/// let records = suite.run(Algorithm::Savings, &SolverParams::default(), 2).unwrap();
///
/// assert!((records[0].min_cost - 16.0).abs() < 1e-9);
/// assert_eq!(records[0].best_gap, Some(0.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BenchmarkSuite {
    cases: Vec<(Arc<Instance>, Option<f64>)>,
}

impl BenchmarkSuite {
    /// Creates an empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instance with an explicit optimum.
    pub fn add(&mut self, instance: Instance, optimum: Option<f64>) -> &mut Self {
        self.cases.push((Arc::new(instance), optimum));
        self
    }

    /// Adds an instance whose optimum is looked up by name.
    pub fn add_known(&mut self, instance: Instance) -> &mut Self {
        let optimum = known_optimum(instance.name());
        self.add(instance, optimum)
    }

    /// Instance names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|(inst, _)| inst.name()).collect()
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// `true` if the suite has no instances.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Solves every instance `runs` times (at least once) with `algorithm`.
    ///
    /// Runs are sequential so their timings do not interfere. With a fixed
    /// seed, run `k` uses `seed + k`.
    pub fn run(
        &self,
        algorithm: Algorithm,
        params: &SolverParams,
        runs: usize,
    ) -> Result<Vec<BenchmarkRecord>, RoutingError> {
        self.cases
            .iter()
            .map(|(instance, optimum)| {
                let solver = Solver::from_shared(Arc::clone(instance));
                let outcomes = (0..runs.max(1))
                    .map(|k| {
                        let mut run_params = params.clone();
                        run_params.random_seed =
                            params.random_seed.map(|s| s.wrapping_add(k as u64));
                        solver.solve(algorithm, &run_params)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let record =
                    BenchmarkRecord::from_outcomes(instance.name(), algorithm, *optimum, &outcomes);
                info!(
                    "{} / {}: avg cost {:.2}, best gap {:?}",
                    record.instance, record.algorithm, record.avg_cost, record.best_gap
                );
                Ok(record)
            })
            .collect()
    }

    /// Runs [`run`](Self::run) for each algorithm, records grouped by
    /// algorithm.
    pub fn compare(
        &self,
        algorithms: &[Algorithm],
        params: &SolverParams,
        runs: usize,
    ) -> Result<Vec<BenchmarkRecord>, RoutingError> {
        let mut records = Vec::new();
        for &algorithm in algorithms {
            records.extend(self.run(algorithm, params, runs)?);
        }
        Ok(records)
    }
}
