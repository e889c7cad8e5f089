//! Simulated annealing over the move vocabulary.
//!
//! # Algorithm
//!
//! Each iteration draws a random move (kind chosen by weight), scores it
//! incrementally, and accepts it with the Metropolis criterion: always when
//! `Δ ≤ 0`, otherwise with probability `exp(-Δ / T)`. Rejected moves are
//! undone through their inverse. After every `iterations_per_temperature`
//! iterations the temperature is multiplied by `cooling_rate`.
//!
//! The best solution is cloned whenever the current objective improves on
//! it, so rejected or worsening moves never touch it.
//!
//! # Reference
//!
//! Kirkpatrick, S., Gelatt, C.D. & Vecchi, M.P. (1983). "Optimization by
//! Simulated Annealing", *Science* 220(4598), 671-680.

use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::Rng;

use super::neighborhood::{random_move, MoveKind};
use super::objective::MoveEvaluator;
use super::report::{SearchReport, SearchStats, StopReason};
use crate::constraints::ConstraintSet;
use crate::models::Solution;

const IMPROVEMENT_EPS: f64 = 1e-9;

/// Relative frequency of each move kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveWeights {
    /// Relocation weight.
    pub relocate: f64,
    /// Swap weight.
    pub swap: f64,
    /// 2-opt weight.
    pub two_opt: f64,
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            relocate: 0.375,
            swap: 0.375,
            two_opt: 0.25,
        }
    }
}

impl MoveWeights {
    fn total(&self) -> f64 {
        self.relocate + self.swap + self.two_opt
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> MoveKind {
        let x = rng.random::<f64>() * self.total();
        if x < self.relocate {
            MoveKind::Relocate
        } else if x < self.relocate + self.swap {
            MoveKind::Swap
        } else {
            MoveKind::TwoOpt
        }
    }
}

/// Configuration for simulated annealing.
///
/// # Examples
///
/// ```
/// use u_ecoroute::local_search::SaConfig;
///
/// let config = SaConfig::default()
///     .with_initial_temperature(500.0)
///     .with_cooling_rate(0.9)
///     .with_max_iterations(2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SaConfig {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// Geometric cooling factor in (0, 1).
    pub cooling_rate: f64,
    /// The search stops once the temperature falls below this.
    pub min_temperature: f64,
    /// Iterations between cooling steps.
    pub iterations_per_temperature: usize,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Wall-clock budget.
    pub time_limit: Option<Duration>,
    /// Move kind frequencies.
    pub weights: MoveWeights,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.95,
            min_temperature: 1.0,
            iterations_per_temperature: 100,
            max_iterations: 10_000,
            time_limit: None,
            weights: MoveWeights::default(),
        }
    }
}

impl SaConfig {
    /// Sets the starting temperature.
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Sets the geometric cooling factor.
    pub fn with_cooling_rate(mut self, alpha: f64) -> Self {
        self.cooling_rate = alpha;
        self
    }

    /// Sets the temperature floor.
    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    /// Sets the iterations between cooling steps.
    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the move-type weights.
    pub fn with_weights(mut self, weights: MoveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_temperature > 0.0) {
            return Err("initial_temperature must be positive".into());
        }
        if !(self.min_temperature > 0.0) {
            return Err("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.initial_temperature {
            return Err("min_temperature must be less than initial_temperature".into());
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if self.iterations_per_temperature == 0 {
            return Err("iterations_per_temperature must be at least 1".into());
        }
        let w = self.weights;
        if w.relocate < 0.0 || w.swap < 0.0 || w.two_opt < 0.0 || !(w.total() > 0.0) {
            return Err("move weights must be non-negative with a positive sum".into());
        }
        Ok(())
    }
}

/// Runs simulated annealing from `initial`.
///
/// The caller owns the random state, so independent runs with separate
/// generators never interfere.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use u_ecoroute::constraints::ConstraintSet;
/// use u_ecoroute::constructive::nearest_neighbor;
/// use u_ecoroute::local_search::{simulated_annealing, SaConfig};
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
///
/// let mut b = InstanceBuilder::new("ring");
/// for i in 0..8 {
///     let a = i as f64 * std::f64::consts::PI / 4.0;
///     b.add_customer(Customer::new(i + 1, Point::new(a.cos() * 10.0, a.sin() * 10.0), 5)).unwrap();
/// }
/// b.fleet(Fleet::homogeneous(20, 3));
/// let initial = nearest_neighbor(Arc::new(b.build().unwrap())).unwrap();
///
/// let constraints = ConstraintSet::default();
/// let config = SaConfig::default().with_max_iterations(500);
/// let report = simulated_annealing(initial, &constraints, &config, &mut StdRng::seed_from_u64(42));
/// assert!(report.iterations <= 500);
/// assert!(report.best_trace.windows(2).all(|w| w[1] <= w[0] + 1e-9));
/// ```
pub fn simulated_annealing<R: Rng>(
    initial: Solution,
    constraints: &ConstraintSet,
    config: &SaConfig,
    rng: &mut R,
) -> SearchReport {
    let start = Instant::now();
    let deadline = config.time_limit.and_then(|d| start.checked_add(d));
    let evaluator = MoveEvaluator::new(constraints);

    let mut current = initial;
    let mut current_obj = evaluator.objective(&current);
    let mut best = current.clone();
    let mut best_obj = current_obj;

    let mut objective_trace = vec![current_obj];
    let mut best_trace = vec![best_obj];
    let mut stats = SearchStats::default();
    let mut temperature = config.initial_temperature;
    let mut iterations = 0usize;

    let stop_reason = loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break StopReason::Deadline;
        }
        if iterations >= config.max_iterations {
            break StopReason::MaxIterations;
        }
        if temperature < config.min_temperature {
            break StopReason::MinTemperature;
        }

        let kind = config.weights.pick(rng);
        let Some(mv) = random_move(&current, kind, rng).or_else(|| {
            MoveKind::ALL
                .into_iter()
                .find_map(|k| random_move(&current, k, rng))
        }) else {
            break StopReason::EmptyNeighborhood;
        };

        let (inverse, delta) = evaluator.apply_scored(&mut current, &mv);
        let accept = delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp();
        if accept {
            current_obj += delta;
            stats.accepted_moves += 1;
            if delta < 0.0 {
                stats.improving_moves += 1;
            }
            if current_obj < best_obj - IMPROVEMENT_EPS {
                current_obj = evaluator.objective(&current);
                if current_obj < best_obj {
                    best = current.clone();
                    best_obj = current_obj;
                    debug!("sa iteration {iterations}: new best {best_obj:.4}");
                }
            }
        } else {
            inverse.apply(&mut current);
        }

        iterations += 1;
        objective_trace.push(current_obj);
        best_trace.push(best_obj);
        trace!("sa iteration {iterations}: T={temperature:.4} current={current_obj:.4}");

        if iterations % config.iterations_per_temperature.max(1) == 0 {
            temperature *= config.cooling_rate;
        }
    };

    stats.final_temperature = Some(temperature);
    let evaluation = constraints.evaluate(&best);
    debug!(
        "sa stopped after {iterations} iterations ({stop_reason}), best {:.4}",
        evaluation.objective
    );
    SearchReport {
        best,
        evaluation,
        iterations,
        elapsed: start.elapsed(),
        objective_trace,
        best_trace,
        stop_reason,
        stats,
    }
}
