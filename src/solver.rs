//! Solver entry point: algorithm selection, parameters, multi-start runs.
//!
//! ```text
//! Algorithm        initial solution          improvement
//! ---------        ----------------          -----------
//! greedy           nearest neighbor          -
//! savings          Clarke-Wright             -
//! sa               `construction` option     simulated annealing
//! tabu             `construction` option     tabu search
//! ```
//!
//! Parameters come either from [`SolverParams`] builders or from a loose
//! JSON option map ([`SolverParams::from_options`]). Unrecognized or
//! malformed options never fail a solve; they produce [`ConfigWarning`]s and
//! fall back to defaults.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use logging_timer::time;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::constraints::{ConstraintSet, Evaluation, DEFAULT_PENALTY_WEIGHT};
use crate::constructive::{clarke_wright_savings, nearest_neighbor};
use crate::error::{ConfigWarning, RoutingError};
use crate::local_search::{
    simulated_annealing, tabu_search, SaConfig, SearchReport, SearchStats, StopReason, TabuConfig,
};
use crate::models::{Instance, Solution};

/// Available solution algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Nearest-neighbor construction only.
    Greedy,
    /// Clarke-Wright savings construction only.
    Savings,
    /// Construction followed by simulated annealing.
    SimulatedAnnealing,
    /// Construction followed by tabu search.
    TabuSearch,
}

impl Algorithm {
    /// Every algorithm, in presentation order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Greedy,
        Algorithm::Savings,
        Algorithm::SimulatedAnnealing,
        Algorithm::TabuSearch,
    ];

    /// Canonical selector name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::Savings => "savings",
            Algorithm::SimulatedAnnealing => "simulated_annealing",
            Algorithm::TabuSearch => "tabu_search",
        }
    }

    /// Whether the algorithm improves a constructed solution.
    pub fn is_metaheuristic(self) -> bool {
        matches!(self, Algorithm::SimulatedAnnealing | Algorithm::TabuSearch)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" | "nearest_neighbor" => Ok(Algorithm::Greedy),
            "savings" | "clarke_wright" => Ok(Algorithm::Savings),
            "simulated_annealing" | "sa" => Ok(Algorithm::SimulatedAnnealing),
            "tabu_search" | "tabu" | "ts" => Ok(Algorithm::TabuSearch),
            _ => Err(RoutingError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Initial-solution heuristic for the metaheuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Construction {
    /// Nearest neighbor.
    #[default]
    Greedy,
    /// Clarke-Wright savings.
    Savings,
}

impl Construction {
    fn build(self, instance: Arc<Instance>) -> Result<Solution, RoutingError> {
        match self {
            Construction::Greedy => nearest_neighbor(instance),
            Construction::Savings => clarke_wright_savings(instance),
        }
    }
}

/// Default iteration budget for simulated annealing.
pub const DEFAULT_SA_ITERATIONS: usize = 10_000;
/// Default iteration budget for tabu search.
pub const DEFAULT_TABU_ITERATIONS: usize = 1_000;

/// Union of every recognized solver option.
///
/// # Examples
///
/// ```
/// use u_ecoroute::solver::{Algorithm, SolverParams};
///
/// let params = SolverParams::default().with_random_seed(7).with_max_iterations(200);
/// assert_eq!(params.random_seed, Some(7));
/// assert_eq!(params.max_iterations_for(Algorithm::TabuSearch), 200);
/// assert_eq!(SolverParams::default().max_iterations_for(Algorithm::SimulatedAnnealing), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    /// Starting annealing temperature.
    pub initial_temperature: f64,
    /// Geometric cooling factor in (0, 1).
    pub cooling_rate: f64,
    /// Annealing stops below this temperature.
    pub min_temperature: f64,
    /// Annealing iterations between cooling steps.
    pub iterations_per_temperature: usize,
    /// Iteration budget; `None` uses the per-algorithm default.
    pub max_iterations: Option<usize>,
    /// Iterations a reversing move stays tabu.
    pub tabu_tenure: usize,
    /// Tabu search stops after this many non-improving iterations.
    pub max_no_improvement: usize,
    /// Tabu candidate list size.
    pub neighborhood_size: usize,
    /// Penalty per unit of constraint violation.
    pub penalty_weight: f64,
    /// Random seed; `None` draws one from entropy.
    pub random_seed: Option<u64>,
    /// Wall-clock budget per run.
    pub time_limit: Option<Duration>,
    /// Initial heuristic for the metaheuristics.
    pub construction: Construction,
}

impl Default for SolverParams {
    fn default() -> Self {
        let sa = SaConfig::default();
        let tabu = TabuConfig::default();
        Self {
            initial_temperature: sa.initial_temperature,
            cooling_rate: sa.cooling_rate,
            min_temperature: sa.min_temperature,
            iterations_per_temperature: sa.iterations_per_temperature,
            max_iterations: None,
            tabu_tenure: tabu.tabu_tenure,
            max_no_improvement: tabu.max_no_improvement,
            neighborhood_size: tabu.neighborhood_size,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
            random_seed: None,
            time_limit: None,
            construction: Construction::default(),
        }
    }
}

impl SolverParams {
    /// Parses a JSON option map.
    ///
    /// Unknown keys, values of the wrong JSON type and out-of-range values
    /// are skipped with a warning; the affected option keeps its default.
    /// Every warning is also logged.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use u_ecoroute::solver::SolverParams;
    ///
    /// let options = json!({ "cooling_rate": 0.9, "tabu_tenure": "long", "colour": "red" });
    /// let (params, warnings) = SolverParams::from_options(options.as_object().unwrap());
    ///
    /// assert!((params.cooling_rate - 0.9).abs() < 1e-12);
    /// assert_eq!(params.tabu_tenure, 20);
    /// assert_eq!(warnings.len(), 2);
    /// ```
    pub fn from_options(options: &Map<String, Value>) -> (Self, Vec<ConfigWarning>) {
        let mut params = SolverParams::default();
        let mut warnings = Vec::new();

        for (key, value) in options {
            let applied = match key.as_str() {
                "initial_temperature" => {
                    positive_f64(value).map(|t| params.initial_temperature = t)
                }
                "cooling_rate" => unit_interval(value).map(|a| params.cooling_rate = a),
                "min_temperature" => positive_f64(value).map(|t| params.min_temperature = t),
                "iterations_per_temperature" => {
                    positive_usize(value).map(|n| params.iterations_per_temperature = n)
                }
                "max_iterations" => {
                    positive_usize(value).map(|n| params.max_iterations = Some(n))
                }
                "tabu_tenure" => positive_usize(value).map(|n| params.tabu_tenure = n),
                "max_no_improvement" => {
                    positive_usize(value).map(|n| params.max_no_improvement = n)
                }
                "neighborhood_size" => {
                    positive_usize(value).map(|n| params.neighborhood_size = n)
                }
                "penalty_weight" => non_negative_f64(value).map(|w| params.penalty_weight = w),
                "random_seed" => seed(value).map(|s| params.random_seed = s),
                "time_limit_secs" => positive_f64(value)
                    .and_then(|secs| {
                        Duration::try_from_secs_f64(secs).map_err(|e| format!("{secs}: {e}"))
                    })
                    .map(|limit| params.time_limit = Some(limit)),
                "construction" => construction(value).map(|c| params.construction = c),
                _ => Err("unrecognized option ignored".to_string()),
            };
            if let Err(message) = applied {
                warnings.push(ConfigWarning::new(key.as_str(), message));
            }
        }

        if params.min_temperature >= params.initial_temperature {
            let defaults = SolverParams::default();
            params.initial_temperature = defaults.initial_temperature;
            params.min_temperature = defaults.min_temperature;
            warnings.push(ConfigWarning::new(
                "min_temperature",
                "must be below initial_temperature; both reset to defaults",
            ));
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        (params, warnings)
    }

    /// Sets the starting temperature.
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Sets the cooling factor.
    pub fn with_cooling_rate(mut self, alpha: f64) -> Self {
        self.cooling_rate = alpha;
        self
    }

    /// Sets the iteration budget for every algorithm.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the tabu tenure.
    pub fn with_tabu_tenure(mut self, tenure: usize) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    /// Sets the penalty weight.
    pub fn with_penalty_weight(mut self, w: f64) -> Self {
        self.penalty_weight = w;
        self
    }

    /// Fixes the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the initial heuristic for the metaheuristics.
    pub fn with_construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    /// Iteration budget for `algorithm`.
    pub fn max_iterations_for(&self, algorithm: Algorithm) -> usize {
        match (self.max_iterations, algorithm) {
            (Some(n), _) => n,
            (None, Algorithm::TabuSearch) => DEFAULT_TABU_ITERATIONS,
            (None, _) => DEFAULT_SA_ITERATIONS,
        }
    }

    /// Annealing configuration.
    pub fn sa_config(&self) -> SaConfig {
        let mut config = SaConfig::default()
            .with_initial_temperature(self.initial_temperature)
            .with_cooling_rate(self.cooling_rate)
            .with_min_temperature(self.min_temperature)
            .with_iterations_per_temperature(self.iterations_per_temperature)
            .with_max_iterations(self.max_iterations_for(Algorithm::SimulatedAnnealing));
        if let Some(limit) = self.time_limit {
            config = config.with_time_limit(limit);
        }
        config
    }

    /// Tabu configuration.
    pub fn tabu_config(&self) -> TabuConfig {
        let mut config = TabuConfig::default()
            .with_max_iterations(self.max_iterations_for(Algorithm::TabuSearch))
            .with_tabu_tenure(self.tabu_tenure)
            .with_max_no_improvement(self.max_no_improvement)
            .with_neighborhood_size(self.neighborhood_size);
        if let Some(limit) = self.time_limit {
            config = config.with_time_limit(limit);
        }
        config
    }

    /// Annealing configuration. When the fields do not form a valid one,
    /// everything but the budget falls back to the defaults with a warning.
    fn checked_sa_config(&self, warnings: &mut Vec<ConfigWarning>) -> SaConfig {
        let config = self.sa_config();
        match config.validate() {
            Ok(()) => config,
            Err(message) => {
                warnings.push(fallback_warning("simulated_annealing", &message));
                SaConfig {
                    max_iterations: config.max_iterations,
                    time_limit: config.time_limit,
                    ..SaConfig::default()
                }
            }
        }
    }

    /// Tabu configuration, with the same fallback as the annealing one.
    fn checked_tabu_config(&self, warnings: &mut Vec<ConfigWarning>) -> TabuConfig {
        let config = self.tabu_config();
        match config.validate() {
            Ok(()) => config,
            Err(message) => {
                warnings.push(fallback_warning("tabu_search", &message));
                TabuConfig {
                    max_iterations: config.max_iterations,
                    time_limit: config.time_limit,
                    ..TabuConfig::default()
                }
            }
        }
    }

    /// The default validators with this penalty weight.
    pub fn constraints(&self) -> ConstraintSet {
        ConstraintSet::new(self.penalty_weight)
    }
}

fn fallback_warning(option: &str, message: &str) -> ConfigWarning {
    let warning = ConfigWarning::new(option, format!("{message}; search parameters reset to defaults"));
    warn!("{warning}");
    warning
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("expected a number, got {value}"))
}

fn positive_f64(value: &Value) -> Result<f64, String> {
    let v = number(value)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(format!("must be positive, got {v}"))
    }
}

fn non_negative_f64(value: &Value) -> Result<f64, String> {
    let v = number(value)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(format!("must be non-negative, got {v}"))
    }
}

fn unit_interval(value: &Value) -> Result<f64, String> {
    let v = number(value)?;
    if v > 0.0 && v < 1.0 {
        Ok(v)
    } else {
        Err(format!("must be in (0, 1), got {v}"))
    }
}

fn positive_usize(value: &Value) -> Result<usize, String> {
    match value.as_u64() {
        Some(0) => Err("must be at least 1".to_string()),
        Some(n) => usize::try_from(n).map_err(|_| format!("{n} is too large")),
        None => Err(format!("expected a positive integer, got {value}")),
    }
}

fn seed(value: &Value) -> Result<Option<u64>, String> {
    match value {
        Value::Null => Ok(None),
        _ => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("expected a non-negative integer or null, got {value}")),
    }
}

fn construction(value: &Value) -> Result<Construction, String> {
    match value.as_str() {
        Some("greedy") => Ok(Construction::Greedy),
        Some("savings") => Ok(Construction::Savings),
        _ => Err(format!("expected \"greedy\" or \"savings\", got {value}")),
    }
}

/// Result of one solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Algorithm that produced the solution.
    pub algorithm: Algorithm,
    /// Returned solution (the best found for metaheuristics).
    pub solution: Solution,
    /// Evaluation of `solution`.
    pub evaluation: Evaluation,
    /// Search iterations (0 for construction-only algorithms).
    pub iterations: usize,
    /// Wall-clock time including construction.
    pub elapsed: Duration,
    /// Current objective per iteration, starting with the initial solution.
    pub objective_trace: Vec<f64>,
    /// Best objective per iteration, starting with the initial solution.
    pub best_trace: Vec<f64>,
    /// Why the search ended (`None` for construction-only algorithms).
    pub stop_reason: Option<StopReason>,
    /// Search counters (`None` for construction-only algorithms).
    pub stats: Option<SearchStats>,
    /// Seed the run's generator was created from.
    pub seed: u64,
    /// Configuration problems found while parsing options or building the
    /// search configuration.
    pub warnings: Vec<ConfigWarning>,
}

impl SolveOutcome {
    /// Objective of the returned solution.
    pub fn objective(&self) -> f64 {
        self.evaluation.objective
    }

    /// Whether the returned solution satisfies every constraint.
    pub fn feasible(&self) -> bool {
        self.evaluation.feasible
    }
}

struct Run {
    solution: Solution,
    evaluation: Evaluation,
    iterations: usize,
    objective_trace: Vec<f64>,
    best_trace: Vec<f64>,
    stop_reason: Option<StopReason>,
    stats: Option<SearchStats>,
}

impl Run {
    fn constructed(solution: Solution, constraints: &ConstraintSet) -> Self {
        let evaluation = constraints.evaluate(&solution);
        Self {
            objective_trace: vec![evaluation.objective],
            best_trace: vec![evaluation.objective],
            solution,
            evaluation,
            iterations: 0,
            stop_reason: None,
            stats: None,
        }
    }

    fn searched(report: SearchReport) -> Self {
        Self {
            solution: report.best,
            evaluation: report.evaluation,
            iterations: report.iterations,
            objective_trace: report.objective_trace,
            best_trace: report.best_trace,
            stop_reason: Some(report.stop_reason),
            stats: Some(report.stats),
        }
    }
}

/// Solves one instance with any [`Algorithm`].
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
/// use u_ecoroute::solver::{Algorithm, Solver, SolverParams};
///
/// let mut b = InstanceBuilder::new("square");
/// b.add_customer(Customer::new(1, Point::new(5.0, 5.0), 4)).unwrap();
/// b.add_customer(Customer::new(2, Point::new(-5.0, 5.0), 4)).unwrap();
/// b.add_customer(Customer::new(3, Point::new(-5.0, -5.0), 4)).unwrap();
/// b.add_customer(Customer::new(4, Point::new(5.0, -5.0), 4)).unwrap();
/// b.fleet(Fleet::homogeneous(8, 2));
/// let solver = Solver::new(b.build().unwrap());
///
/// let params = SolverParams::default().with_random_seed(3).with_max_iterations(300);
/// let outcome = solver.solve(Algorithm::SimulatedAnnealing, &params).unwrap();
/// assert!(outcome.feasible());
/// assert_eq!(outcome.solution.served_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    instance: Arc<Instance>,
}

impl Solver {
    /// Creates a solver owning `instance`.
    pub fn new(instance: Instance) -> Self {
        Self::from_shared(Arc::new(instance))
    }

    /// Creates a solver over a shared instance.
    pub fn from_shared(instance: Arc<Instance>) -> Self {
        Self { instance }
    }

    /// The instance being solved.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Runs `algorithm` once.
    ///
    /// Fails only when the instance cannot be served at all
    /// ([`RoutingError::Infeasible`]). Constraint violations in the result
    /// are reported through [`SolveOutcome::evaluation`].
    #[time]
    pub fn solve(
        &self,
        algorithm: Algorithm,
        params: &SolverParams,
    ) -> Result<SolveOutcome, RoutingError> {
        info!(
            "solving '{}' with {} ({} customers)",
            self.instance.name(),
            algorithm,
            self.instance.num_customers()
        );
        let start = Instant::now();
        let seed = params.random_seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let constraints = params.constraints();
        let instance = Arc::clone(&self.instance);
        let mut warnings = Vec::new();

        let run = match algorithm {
            Algorithm::Greedy => Run::constructed(nearest_neighbor(instance)?, &constraints),
            Algorithm::Savings => Run::constructed(clarke_wright_savings(instance)?, &constraints),
            Algorithm::SimulatedAnnealing => {
                let initial = params.construction.build(instance)?;
                Run::searched(simulated_annealing(
                    initial,
                    &constraints,
                    &params.checked_sa_config(&mut warnings),
                    &mut rng,
                ))
            }
            Algorithm::TabuSearch => {
                let initial = params.construction.build(instance)?;
                Run::searched(tabu_search(
                    initial,
                    &constraints,
                    &params.checked_tabu_config(&mut warnings),
                    &mut rng,
                ))
            }
        };

        let elapsed = start.elapsed();
        info!(
            "{} finished: objective {:.3}, feasible {}, {} iterations in {:.3}s",
            algorithm,
            run.evaluation.objective,
            run.evaluation.feasible,
            run.iterations,
            elapsed.as_secs_f64()
        );

        Ok(SolveOutcome {
            algorithm,
            solution: run.solution,
            evaluation: run.evaluation,
            iterations: run.iterations,
            elapsed,
            objective_trace: run.objective_trace,
            best_trace: run.best_trace,
            stop_reason: run.stop_reason,
            stats: run.stats,
            seed,
            warnings,
        })
    }

    /// Runs the algorithm named `algorithm` with a loose JSON option map.
    ///
    /// Fails with [`RoutingError::UnknownAlgorithm`] for an unrecognized
    /// selector. Option problems end up in [`SolveOutcome::warnings`].
    pub fn solve_with_options(
        &self,
        algorithm: &str,
        options: &Map<String, Value>,
    ) -> Result<SolveOutcome, RoutingError> {
        let algorithm: Algorithm = algorithm.parse()?;
        let (params, warnings) = SolverParams::from_options(options);
        let mut outcome = self.solve(algorithm, &params)?;
        outcome.warnings.splice(0..0, warnings);
        Ok(outcome)
    }

    /// Runs `algorithm` once per seed in parallel and keeps the lowest
    /// objective. Ties go to the earliest seed. With no seeds this is a
    /// single [`solve`](Self::solve) with `params` as given.
    #[time]
    pub fn solve_multi_start(
        &self,
        algorithm: Algorithm,
        params: &SolverParams,
        seeds: &[u64],
    ) -> Result<SolveOutcome, RoutingError> {
        let outcomes = seeds
            .par_iter()
            .map(|&seed| self.solve(algorithm, &params.clone().with_random_seed(seed)))
            .collect::<Result<Vec<_>, _>>()?;

        let best = outcomes.into_iter().reduce(|best, outcome| {
            if outcome.objective() < best.objective() {
                outcome
            } else {
                best
            }
        });
        match best {
            Some(outcome) => Ok(outcome),
            None => self.solve(algorithm, params),
        }
    }
}
