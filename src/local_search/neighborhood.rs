//! Neighborhood generation: random moves and full enumeration.

use rand::seq::index;
use rand::Rng;

use super::moves::{Move, Position, Slot};
use crate::models::Solution;

const MAX_ATTEMPTS: usize = 16;

/// The three move families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Customer relocation.
    Relocate,
    /// Customer exchange.
    Swap,
    /// Segment reversal.
    TwoOpt,
}

impl MoveKind {
    /// All kinds, in a fixed order.
    pub const ALL: [MoveKind; 3] = [MoveKind::Relocate, MoveKind::Swap, MoveKind::TwoOpt];
}

/// Vehicle type for a new route serving `demand`, if any type has vehicles
/// left: the cheapest that fits, else the largest with vehicles left.
pub fn spare_vehicle_type(solution: &Solution, demand: i32) -> Option<usize> {
    let fleet = solution.instance().fleet();
    let used = solution.vehicles_used();
    let spare = |t: usize| used[t] < fleet.types()[t].count();
    fleet.cheapest_among(demand, spare).or_else(|| {
        let mut best: Option<usize> = None;
        for (t, vt) in fleet.types().iter().enumerate() {
            if spare(t) && best.map_or(true, |b| vt.capacity() > fleet.types()[b].capacity()) {
                best = Some(t);
            }
        }
        best
    })
}

/// Draws one random move of the given kind, or `None` if the solution has
/// no move of that kind.
pub fn random_move<R: Rng>(solution: &Solution, kind: MoveKind, rng: &mut R) -> Option<Move> {
    match kind {
        MoveKind::Relocate => random_relocate(solution, rng),
        MoveKind::Swap => random_swap(solution, rng),
        MoveKind::TwoOpt => random_two_opt(solution, rng),
    }
}

fn random_relocate<R: Rng>(solution: &Solution, rng: &mut R) -> Option<Move> {
    let n_routes = solution.num_routes();
    if n_routes == 0 || (n_routes == 1 && solution.route(0).len() < 2) {
        return None;
    }
    for _ in 0..MAX_ATTEMPTS {
        let r = rng.random_range(0..n_routes);
        let len_r = solution.route(r).len();
        let i = rng.random_range(0..len_r);
        let customer = solution.route(r).customers()[i];
        let new_type = if len_r >= 2 {
            spare_vehicle_type(solution, solution.instance().demand(customer))
        } else {
            None
        };

        let t = rng.random_range(0..n_routes + usize::from(new_type.is_some()));
        if t == n_routes {
            let vehicle_type = new_type?;
            return Some(Move::Relocate {
                from: Position::new(r, i),
                to: Slot::NewRoute {
                    vehicle_type,
                    route: n_routes,
                    id: None,
                },
            });
        }
        if t == r {
            if len_r < 2 {
                continue;
            }
            let j = rng.random_range(0..len_r);
            if j == i {
                continue;
            }
            return Some(Move::Relocate {
                from: Position::new(r, i),
                to: Slot::Existing(Position::new(r, j)),
            });
        }
        let j = rng.random_range(0..=solution.route(t).len());
        let target = if len_r == 1 && t > r { t - 1 } else { t };
        return Some(Move::Relocate {
            from: Position::new(r, i),
            to: Slot::Existing(Position::new(target, j)),
        });
    }
    None
}

fn position_of_rank(solution: &Solution, mut rank: usize) -> Option<Position> {
    for (ri, r) in solution.routes().iter().enumerate() {
        if rank < r.len() {
            return Some(Position::new(ri, rank));
        }
        rank -= r.len();
    }
    None
}

fn random_swap<R: Rng>(solution: &Solution, rng: &mut R) -> Option<Move> {
    let served = solution.served_count();
    if served < 2 {
        return None;
    }
    let picked = index::sample(rng, served, 2);
    let (x, y) = (picked.index(0), picked.index(1));
    let (lo, hi) = if x < y { (x, y) } else { (y, x) };
    Some(Move::Swap {
        a: position_of_rank(solution, lo)?,
        b: position_of_rank(solution, hi)?,
    })
}

fn random_two_opt<R: Rng>(solution: &Solution, rng: &mut R) -> Option<Move> {
    let eligible: Vec<usize> = (0..solution.num_routes())
        .filter(|&r| solution.route(r).len() >= 2)
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let route = eligible[rng.random_range(0..eligible.len())];
    let picked = index::sample(rng, solution.route(route).len(), 2);
    let (x, y) = (picked.index(0), picked.index(1));
    Some(Move::TwoOpt {
        route,
        start: x.min(y),
        end: x.max(y),
    })
}

/// Every move of the vocabulary, in a deterministic order: relocations,
/// then swaps, then reversals.
pub fn enumerate_moves(solution: &Solution) -> Vec<Move> {
    let mut moves = Vec::new();
    let n_routes = solution.num_routes();

    for r in 0..n_routes {
        let len_r = solution.route(r).len();
        for i in 0..len_r {
            let from = Position::new(r, i);
            for t in 0..n_routes {
                if t == r {
                    if len_r < 2 {
                        continue;
                    }
                    for j in (0..len_r).filter(|&j| j != i) {
                        moves.push(Move::Relocate {
                            from,
                            to: Slot::Existing(Position::new(r, j)),
                        });
                    }
                    continue;
                }
                let target = if len_r == 1 && t > r { t - 1 } else { t };
                for j in 0..=solution.route(t).len() {
                    moves.push(Move::Relocate {
                        from,
                        to: Slot::Existing(Position::new(target, j)),
                    });
                }
            }
            if len_r >= 2 {
                let customer = solution.route(r).customers()[i];
                if let Some(vehicle_type) =
                    spare_vehicle_type(solution, solution.instance().demand(customer))
                {
                    moves.push(Move::Relocate {
                        from,
                        to: Slot::NewRoute {
                            vehicle_type,
                            route: n_routes,
                            id: None,
                        },
                    });
                }
            }
        }
    }

    let positions: Vec<Position> = solution
        .routes()
        .iter()
        .enumerate()
        .flat_map(|(ri, r)| (0..r.len()).map(move |i| Position::new(ri, i)))
        .collect();
    for (k, &a) in positions.iter().enumerate() {
        for &b in &positions[k + 1..] {
            moves.push(Move::Swap { a, b });
        }
    }

    for (ri, r) in solution.routes().iter().enumerate() {
        for start in 0..r.len() {
            for end in (start + 1)..r.len() {
                moves.push(Move::TwoOpt {
                    route: ri,
                    start,
                    end,
                });
            }
        }
    }
    moves
}

/// The full neighborhood if it has at most `size` moves, else a uniform
/// random sample of `size` moves in enumeration order.
pub fn candidate_moves<R: Rng>(solution: &Solution, size: usize, rng: &mut R) -> Vec<Move> {
    let all = enumerate_moves(solution);
    if all.len() <= size {
        return all;
    }
    let mut picked = index::sample(rng, all.len(), size).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| all[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, Instance, InstanceBuilder, Point, VehicleType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn instance(fleet: Fleet) -> Arc<Instance> {
        let mut b = InstanceBuilder::new("hood");
        for i in 1..=5 {
            b.add_customer(Customer::new(i, Point::new(i as f64, 2.0), 2))
                .expect("ok");
        }
        b.fleet(fleet);
        Arc::new(b.build().expect("valid"))
    }

    fn solution(fleet: Fleet) -> Solution {
        let mut sol = Solution::new(instance(fleet));
        sol.open_route(0, vec![1, 2, 3]);
        sol.open_route(0, vec![4]);
        sol.open_route(0, vec![5]);
        sol
    }

    #[test]
    fn test_enumeration_counts() {
        // no spare vehicles: no new-route relocations
        let sol = solution(Fleet::homogeneous(10, 3));
        let moves = enumerate_moves(&sol);
        let relocates = moves
            .iter()
            .filter(|m| matches!(m, Move::Relocate { .. }))
            .count();
        let swaps = moves.iter().filter(|m| matches!(m, Move::Swap { .. })).count();
        let reversals = moves
            .iter()
            .filter(|m| matches!(m, Move::TwoOpt { .. }))
            .count();
        // route 0: 3 * (2 + 2 + 2); singletons: 2 * (4 + 2)
        assert_eq!(relocates, 18 + 12);
        assert_eq!(swaps, 10);
        assert_eq!(reversals, 3);
    }

    #[test]
    fn test_new_route_only_with_spare_vehicle() {
        let tight = solution(Fleet::homogeneous(10, 3));
        assert!(!enumerate_moves(&tight)
            .iter()
            .any(|m| matches!(m, Move::Relocate { to: Slot::NewRoute { .. }, .. })));

        let roomy = solution(Fleet::new(vec![
            VehicleType::new("a", 10, 3),
            VehicleType::new("b", 5, 1),
        ]));
        let new_routes: Vec<Move> = enumerate_moves(&roomy)
            .into_iter()
            .filter(|m| matches!(m, Move::Relocate { to: Slot::NewRoute { .. }, .. }))
            .collect();
        assert_eq!(new_routes.len(), 3);
        assert!(new_routes.iter().all(|m| matches!(
            m,
            Move::Relocate {
                to: Slot::NewRoute { vehicle_type: 1, route: 3, .. },
                ..
            }
        )));
    }

    #[test]
    fn test_every_enumerated_move_applies_and_undoes() {
        let sol = solution(Fleet::homogeneous(10, 4));
        for mv in enumerate_moves(&sol) {
            let mut s = sol.clone();
            let undo = mv.apply(&mut s);
            assert_eq!(s.served_count(), 5);
            undo.apply(&mut s);
            assert_eq!(s.routes(), sol.routes());
        }
    }

    #[test]
    fn test_random_moves_apply() {
        let sol = solution(Fleet::homogeneous(10, 4));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            for kind in MoveKind::ALL {
                let mv = random_move(&sol, kind, &mut rng).expect("move exists");
                let mut s = sol.clone();
                let undo = mv.apply(&mut s);
                undo.apply(&mut s);
                assert_eq!(s.routes(), sol.routes());
            }
        }
    }

    #[test]
    fn test_no_moves_for_single_customer() {
        let mut b = InstanceBuilder::new("one");
        b.add_customer(Customer::new(1, Point::new(1.0, 0.0), 1))
            .expect("ok");
        b.fleet(Fleet::homogeneous(5, 2));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1]);
        let mut rng = StdRng::seed_from_u64(1);
        for kind in MoveKind::ALL {
            assert!(random_move(&sol, kind, &mut rng).is_none());
        }
        assert!(enumerate_moves(&sol).is_empty());
    }

    #[test]
    fn test_candidate_sample_size() {
        let sol = solution(Fleet::homogeneous(10, 3));
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(candidate_moves(&sol, 1000, &mut rng).len(), 43);
        assert_eq!(candidate_moves(&sol, 12, &mut rng).len(), 12);
    }
}
