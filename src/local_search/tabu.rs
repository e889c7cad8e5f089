//! Tabu search over the move vocabulary.
//!
//! # Algorithm
//!
//! 1. Build the candidate list: the whole neighborhood when it has at most
//!    `neighborhood_size` moves, otherwise a random sample of that size.
//! 2. Score every candidate incrementally.
//! 3. Pick the lowest resulting objective among candidates that are not
//!    tabu, or that are tabu but beat the best objective so far
//!    (aspiration). Ties go to the first candidate found.
//! 4. Apply it and forbid its reverse for `tabu_tenure` iterations.
//! 5. Stop after `max_iterations`, after `max_no_improvement` iterations
//!    without a new best, or when no candidate is admissible.
//!
//! Tabu attributes name customers and route ids rather than positions, so
//! they stay meaningful while routes shift.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::Rng;

use super::moves::{Move, Slot};
use super::neighborhood::candidate_moves;
use super::objective::MoveEvaluator;
use super::report::{SearchReport, SearchStats, StopReason};
use crate::constraints::ConstraintSet;
use crate::models::{RouteId, Solution};

const IMPROVEMENT_EPS: f64 = 1e-9;

/// Configuration parameters for tabu search.
///
/// # Examples
///
/// ```
/// use u_ecoroute::local_search::TabuConfig;
///
/// let config = TabuConfig::default()
///     .with_max_iterations(300)
///     .with_tabu_tenure(7);
/// assert_eq!(config.tabu_tenure, 7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TabuConfig {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// How many iterations a reversed move stays forbidden.
    pub tabu_tenure: usize,
    /// Whether a tabu move that beats the best solution may be applied.
    pub aspiration: bool,
    /// Maximum iterations without improvement before stopping.
    pub max_no_improvement: usize,
    /// Candidate list size.
    pub neighborhood_size: usize,
    /// Wall-clock budget.
    pub time_limit: Option<Duration>,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tabu_tenure: 20,
            aspiration: true,
            max_no_improvement: 200,
            neighborhood_size: 100,
            time_limit: None,
        }
    }
}

impl TabuConfig {
    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the tabu tenure.
    pub fn with_tabu_tenure(mut self, tenure: usize) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    /// Enables or disables the aspiration criterion.
    pub fn with_aspiration(mut self, aspiration: bool) -> Self {
        self.aspiration = aspiration;
        self
    }

    /// Sets maximum iterations without improvement.
    pub fn with_max_no_improvement(mut self, n: usize) -> Self {
        self.max_no_improvement = n;
        self
    }

    /// Sets the candidate list size.
    pub fn with_neighborhood_size(mut self, n: usize) -> Self {
        self.neighborhood_size = n;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.tabu_tenure == 0 {
            return Err("tabu_tenure must be at least 1".into());
        }
        if self.neighborhood_size == 0 {
            return Err("neighborhood_size must be at least 1".into());
        }
        if self.max_no_improvement == 0 {
            return Err("max_no_improvement must be at least 1".into());
        }
        Ok(())
    }
}

/// What a tabu entry forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabuAttribute {
    /// Placing `customer` into route `route` (`None`: a new route).
    Placement {
        /// Customer location index.
        customer: usize,
        /// Target route.
        route: Option<RouteId>,
    },
    /// Exchanging two customers (stored in ascending order).
    Exchange {
        /// Smaller location index.
        low: usize,
        /// Larger location index.
        high: usize,
    },
    /// Reversing the stretch of `route` between two customers.
    Reversal {
        /// Route.
        route: RouteId,
        /// Smaller endpoint customer.
        low: usize,
        /// Larger endpoint customer.
        high: usize,
    },
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl TabuAttribute {
    /// Attribute of applying `mv` to `solution`.
    pub fn of_move(mv: &Move, solution: &Solution) -> Self {
        match *mv {
            Move::Relocate { from, to } => {
                let customer = solution.route(from.route).customers()[from.index];
                let route = match to {
                    Slot::Existing(p) => {
                        let source_drops = solution.route(from.route).len() == 1;
                        let target = if source_drops && p.route >= from.route {
                            p.route + 1
                        } else {
                            p.route
                        };
                        Some(solution.route(target).id())
                    }
                    Slot::NewRoute { .. } => None,
                };
                TabuAttribute::Placement { customer, route }
            }
            Move::Swap { a, b } => {
                let (low, high) = ordered(
                    solution.route(a.route).customers()[a.index],
                    solution.route(b.route).customers()[b.index],
                );
                TabuAttribute::Exchange { low, high }
            }
            Move::TwoOpt { route, start, end } => {
                let r = solution.route(route);
                let (low, high) = ordered(r.customers()[start], r.customers()[end]);
                TabuAttribute::Reversal {
                    route: r.id(),
                    low,
                    high,
                }
            }
        }
    }

    /// Attribute of the move that would undo `mv`, computed before applying it.
    pub fn of_reverse(mv: &Move, solution: &Solution) -> Self {
        match *mv {
            Move::Relocate { from, .. } => {
                let source = solution.route(from.route);
                let route = (source.len() > 1).then(|| source.id());
                TabuAttribute::Placement {
                    customer: source.customers()[from.index],
                    route,
                }
            }
            // swaps and reversals are their own inverse
            _ => Self::of_move(mv, solution),
        }
    }
}

/// Forbidden attributes with their expiry iteration.
#[derive(Debug, Clone, Default)]
pub struct TabuList {
    entries: HashMap<TabuAttribute, usize>,
}

impl TabuList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbids `attribute` until iteration `expiry` (exclusive).
    pub fn insert(&mut self, attribute: TabuAttribute, expiry: usize) {
        self.entries.insert(attribute, expiry);
    }

    /// Whether `attribute` is forbidden at `iteration`.
    pub fn is_tabu(&self, attribute: &TabuAttribute, iteration: usize) -> bool {
        self.entries
            .get(attribute)
            .is_some_and(|&expiry| iteration < expiry)
    }

    /// Drops entries expired at `iteration`.
    pub fn evict(&mut self, iteration: usize) {
        self.entries.retain(|_, &mut expiry| iteration < expiry);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is forbidden.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A scored candidate move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Objective after applying the move.
    pub objective: f64,
    /// Whether the move's attribute is on the tabu list.
    pub tabu: bool,
}

/// Outcome of candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Index of the chosen candidate.
    pub index: usize,
    /// Whether a tabu move was admitted by aspiration.
    pub aspirated: bool,
}

/// Steepest admissible candidate; ties keep the earliest.
///
/// A tabu candidate is admissible only if `aspiration` is on and its
/// objective is strictly below `best_objective`.
pub fn select_candidate(
    candidates: &[Candidate],
    best_objective: f64,
    aspiration: bool,
) -> Option<Selection> {
    let mut chosen: Option<(Selection, f64)> = None;
    for (index, c) in candidates.iter().enumerate() {
        let aspirated = c.tabu && aspiration && c.objective < best_objective - IMPROVEMENT_EPS;
        if c.tabu && !aspirated {
            continue;
        }
        if chosen.map_or(true, |(_, obj)| c.objective < obj) {
            chosen = Some((Selection { index, aspirated }, c.objective));
        }
    }
    chosen.map(|(s, _)| s)
}

/// Runs tabu search from `initial`.
///
/// The random state only drives candidate sampling on large neighborhoods.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use u_ecoroute::constraints::ConstraintSet;
/// use u_ecoroute::constructive::nearest_neighbor;
/// use u_ecoroute::local_search::{tabu_search, TabuConfig};
/// use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point};
///
/// let mut b = InstanceBuilder::new("ring");
/// for i in 0..6 {
///     let a = i as f64;
///     b.add_customer(Customer::new(i + 1, Point::new(a.cos() * 10.0, a.sin() * 10.0), 5)).unwrap();
/// }
/// b.fleet(Fleet::homogeneous(15, 3));
/// let initial = nearest_neighbor(Arc::new(b.build().unwrap())).unwrap();
///
/// let constraints = ConstraintSet::default();
/// let config = TabuConfig::default().with_max_iterations(50);
/// let report = tabu_search(initial, &constraints, &config, &mut StdRng::seed_from_u64(1));
/// assert!(report.iterations <= 50);
/// assert!(report.feasible());
/// ```
pub fn tabu_search<R: Rng>(
    initial: Solution,
    constraints: &ConstraintSet,
    config: &TabuConfig,
    rng: &mut R,
) -> SearchReport {
    run_tabu(initial, constraints, config, rng, |_| {})
}

/// One applied move, as seen by the driver.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(test), allow(dead_code))]
struct TabuStep {
    iteration: usize,
    attribute: TabuAttribute,
    reverse: TabuAttribute,
    tabu: bool,
    aspirated: bool,
    objective: f64,
    best_before: f64,
}

fn run_tabu<R: Rng, F: FnMut(&TabuStep)>(
    initial: Solution,
    constraints: &ConstraintSet,
    config: &TabuConfig,
    rng: &mut R,
    mut on_step: F,
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
    let mut tabu = TabuList::new();
    let mut iterations = 0usize;
    let mut since_improvement = 0usize;

    let stop_reason = loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break StopReason::Deadline;
        }
        if iterations >= config.max_iterations {
            break StopReason::MaxIterations;
        }
        if since_improvement >= config.max_no_improvement {
            break StopReason::NoImprovement;
        }

        let moves = candidate_moves(&current, config.neighborhood_size, rng);
        if moves.is_empty() {
            break StopReason::EmptyNeighborhood;
        }
        let scored: Vec<Candidate> = moves
            .iter()
            .map(|mv| {
                let attribute = TabuAttribute::of_move(mv, &current);
                Candidate {
                    objective: current_obj + evaluator.delta(&mut current, mv),
                    tabu: tabu.is_tabu(&attribute, iterations),
                }
            })
            .collect();

        let Some(selection) = select_candidate(&scored, best_obj, config.aspiration) else {
            stats.tabu_rejections += scored.len();
            break StopReason::NoAdmissibleMove;
        };
        stats.tabu_rejections += scored
            .iter()
            .filter(|c| c.tabu && !(config.aspiration && c.objective < best_obj - IMPROVEMENT_EPS))
            .count();
        if selection.aspirated {
            stats.aspirations += 1;
        }

        let mv = moves[selection.index];
        let attribute = TabuAttribute::of_move(&mv, &current);
        let reverse = TabuAttribute::of_reverse(&mv, &current);
        let (_, delta) = evaluator.apply_scored(&mut current, &mv);
        current_obj += delta;
        on_step(&TabuStep {
            iteration: iterations,
            attribute,
            reverse,
            tabu: scored[selection.index].tabu,
            aspirated: selection.aspirated,
            objective: current_obj,
            best_before: best_obj,
        });
        stats.accepted_moves += 1;
        if delta < 0.0 {
            stats.improving_moves += 1;
        }
        tabu.insert(reverse, iterations + 1 + config.tabu_tenure);
        iterations += 1;
        tabu.evict(iterations);

        if current_obj < best_obj - IMPROVEMENT_EPS {
            current_obj = evaluator.objective(&current);
            best = current.clone();
            best_obj = current_obj;
            since_improvement = 0;
            debug!("tabu iteration {iterations}: new best {best_obj:.4}");
        } else {
            since_improvement += 1;
        }

        objective_trace.push(current_obj);
        best_trace.push(best_obj);
        trace!(
            "tabu iteration {iterations}: current={current_obj:.4} tabu_len={}",
            tabu.len()
        );
    };

    let evaluation = constraints.evaluate(&best);
    debug!(
        "tabu stopped after {iterations} iterations ({stop_reason}), best {:.4}",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::nearest_neighbor;
    use crate::local_search::moves::Position;
    use crate::models::{Customer, Fleet, Instance, InstanceBuilder, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn random_instance(seed: u64, n: usize) -> Arc<Instance> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut b = InstanceBuilder::new("random");
        for i in 1..=n {
            let p = Point::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
            b.add_customer(Customer::new(i, p, rng.random_range(1..10)))
                .expect("ok");
        }
        b.fleet(Fleet::homogeneous(30, n));
        Arc::new(b.build().expect("valid"))
    }

    fn cand(objective: f64, tabu: bool) -> Candidate {
        Candidate { objective, tabu }
    }

    #[test]
    fn test_config_defaults() {
        let c = TabuConfig::default();
        assert_eq!(c.tabu_tenure, 20);
        assert_eq!(c.max_iterations, 1000);
        assert_eq!(c.max_no_improvement, 200);
        assert_eq!(c.neighborhood_size, 100);
        assert!(c.validate().is_ok());
        assert!(c.with_tabu_tenure(0).validate().is_err());
    }

    #[test]
    fn test_select_steepest_first_found() {
        let cands = [cand(10.0, false), cand(8.0, false), cand(8.0, false)];
        assert_eq!(
            select_candidate(&cands, 5.0, true),
            Some(Selection {
                index: 1,
                aspirated: false
            })
        );
    }

    #[test]
    fn test_select_skips_tabu_without_aspiration() {
        let cands = [cand(6.0, true), cand(9.0, false)];
        let s = select_candidate(&cands, 5.0, true).expect("admissible");
        assert_eq!(s.index, 1);
    }

    #[test]
    fn test_select_aspiration() {
        let cands = [cand(4.0, true), cand(9.0, false)];
        let s = select_candidate(&cands, 5.0, true).expect("admissible");
        assert_eq!(s.index, 0);
        assert!(s.aspirated);

        let s = select_candidate(&cands, 5.0, false).expect("admissible");
        assert_eq!(s.index, 1);
    }

    #[test]
    fn test_select_equal_to_best_does_not_aspirate() {
        let cands = [cand(5.0, true)];
        assert_eq!(select_candidate(&cands, 5.0, true), None);
    }

    #[test]
    fn test_tabu_list_expiry() {
        let mut list = TabuList::new();
        let attr = TabuAttribute::Exchange { low: 1, high: 2 };
        list.insert(attr, 5);
        assert!(list.is_tabu(&attr, 4));
        assert!(!list.is_tabu(&attr, 5));
        list.evict(4);
        assert_eq!(list.len(), 1);
        list.evict(5);
        assert!(list.is_empty());
    }

    #[test]
    fn test_reverse_attribute_blocks_undo() {
        let inst = random_instance(11, 4);
        let mut sol = Solution::new(inst);
        sol.open_route(0, vec![1, 2]);
        sol.open_route(0, vec![3, 4]);
        let source_id = sol.route(0).id();
        let mv = Move::Relocate {
            from: Position::new(0, 0),
            to: Slot::Existing(Position::new(1, 1)),
        };
        let reverse = TabuAttribute::of_reverse(&mv, &sol);
        assert_eq!(
            reverse,
            TabuAttribute::Placement {
                customer: 1,
                route: Some(source_id)
            }
        );
        let undo = mv.apply(&mut sol);
        assert_eq!(TabuAttribute::of_move(&undo, &sol), reverse);
    }

    #[test]
    fn test_swap_and_reversal_attributes_symmetric() {
        let inst = random_instance(12, 4);
        let mut sol = Solution::new(inst);
        sol.open_route(0, vec![1, 2, 3]);
        sol.open_route(0, vec![4]);
        for mv in [
            Move::Swap {
                a: Position::new(0, 1),
                b: Position::new(1, 0),
            },
            Move::TwoOpt {
                route: 0,
                start: 0,
                end: 2,
            },
        ] {
            let reverse = TabuAttribute::of_reverse(&mv, &sol);
            let mut s = sol.clone();
            let undo = mv.apply(&mut s);
            assert_eq!(TabuAttribute::of_move(&undo, &s), reverse);
        }
    }

    #[test]
    fn test_tabu_improves_and_traces() {
        let initial = nearest_neighbor(random_instance(21, 15)).expect("ok");
        let constraints = ConstraintSet::default();
        let initial_obj = constraints.evaluate(&initial).objective;
        let config = TabuConfig::default().with_max_iterations(100);
        let report = tabu_search(initial, &constraints, &config, &mut StdRng::seed_from_u64(3));
        assert!(report.best_objective() <= initial_obj + 1e-9);
        assert_eq!(report.best.served_count(), 15);
        assert_eq!(report.objective_trace.len(), report.iterations + 1);
        for w in report.best_trace.windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn test_tabu_no_improvement_stop() {
        let initial = nearest_neighbor(random_instance(5, 8)).expect("ok");
        let constraints = ConstraintSet::default();
        let config = TabuConfig::default()
            .with_max_iterations(10_000)
            .with_max_no_improvement(10);
        let report = tabu_search(initial, &constraints, &config, &mut StdRng::seed_from_u64(4));
        assert!(matches!(
            report.stop_reason,
            StopReason::NoImprovement | StopReason::NoAdmissibleMove
        ));
        assert!(report.iterations < 10_000);
    }

    #[test]
    fn test_tabu_unbounded_time_limit() {
        let initial = nearest_neighbor(random_instance(3, 6)).expect("ok");
        let config = TabuConfig::default()
            .with_max_iterations(10)
            .with_time_limit(Duration::MAX);
        let report = tabu_search(
            initial,
            &ConstraintSet::default(),
            &config,
            &mut StdRng::seed_from_u64(3),
        );
        assert!(report.iterations <= 10);
        assert_ne!(report.stop_reason, StopReason::Deadline);
    }

    #[test]
    fn test_tabu_applied_moves_respect_list() {
        let initial = nearest_neighbor(random_instance(8, 7)).expect("ok");
        let constraints = ConstraintSet::default();
        let tenure = 5;
        let config = TabuConfig::default()
            .with_max_iterations(120)
            .with_tabu_tenure(tenure)
            .with_max_no_improvement(120);
        let mut steps = Vec::new();
        let report = run_tabu(
            initial,
            &constraints,
            &config,
            &mut StdRng::seed_from_u64(8),
            |step| steps.push(*step),
        );
        assert_eq!(steps.len(), report.iterations);

        // reverse attribute -> last iteration at which it is still forbidden
        let mut forbidden: HashMap<TabuAttribute, usize> = HashMap::new();
        let mut tabu_hits = 0;
        for step in &steps {
            let is_forbidden = forbidden
                .get(&step.attribute)
                .is_some_and(|&until| step.iteration <= until);
            assert_eq!(step.tabu, is_forbidden, "iteration {}", step.iteration);
            if is_forbidden {
                tabu_hits += 1;
                assert!(step.aspirated);
                assert!(step.objective < step.best_before);
            } else {
                assert!(!step.aspirated);
            }
            forbidden.insert(step.reverse, step.iteration + tenure);
        }
        assert_eq!(tabu_hits, report.stats.aspirations);
    }
}
