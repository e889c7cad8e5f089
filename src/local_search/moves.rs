//! Move vocabulary shared by the metaheuristics.
//!
//! Every move edits a [`Solution`] in place and returns its inverse, so a
//! rejected move is undone by applying the inverse:
//!
//! ```
//! use std::sync::Arc;
//! use u_ecoroute::local_search::{Move, Position, Slot};
//! use u_ecoroute::models::{Customer, Fleet, InstanceBuilder, Point, Solution};
//!
//! let mut b = InstanceBuilder::new("undo");
//! for i in 1..=3 {
//!     b.add_customer(Customer::new(i, Point::new(i as f64, 1.0), 1)).unwrap();
//! }
//! b.fleet(Fleet::homogeneous(10, 2));
//! let mut sol = Solution::new(Arc::new(b.build().unwrap()));
//! sol.open_route(0, vec![1, 2]);
//! sol.open_route(0, vec![3]);
//! let before = sol.routes().to_vec();
//!
//! let mv = Move::Relocate {
//!     from: Position { route: 1, index: 0 },
//!     to: Slot::Existing(Position { route: 0, index: 1 }),
//! };
//! let undo = mv.apply(&mut sol);
//! assert_eq!(sol.num_routes(), 1);
//! undo.apply(&mut sol);
//! assert_eq!(sol.routes(), &before[..]);
//! ```

use crate::models::{RouteId, Solution};

/// A customer position: route index and index within the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Route index in the solution.
    pub route: usize,
    /// Index within the route.
    pub index: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(route: usize, index: usize) -> Self {
        Self { route, index }
    }
}

/// Destination of a relocated customer.
///
/// Indices refer to the solution *after* the customer has been removed from
/// its source route (which may have dropped the source route).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Insert before `index` in an existing route.
    Existing(Position),
    /// Open a single-customer route at route index `route`.
    NewRoute {
        /// Vehicle type of the new route.
        vehicle_type: usize,
        /// Route index the new route is inserted at.
        route: usize,
        /// Id to restore; `None` allocates a fresh id.
        id: Option<RouteId>,
    },
}

/// An atomic edit of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Move one customer to another position, same or different route.
    Relocate {
        /// Current position of the customer.
        from: Position,
        /// Where it goes.
        to: Slot,
    },
    /// Exchange two customers.
    Swap {
        /// First position.
        a: Position,
        /// Second position.
        b: Position,
    },
    /// Reverse positions `start..=end` of one route.
    TwoOpt {
        /// Route index.
        route: usize,
        /// First reversed position.
        start: usize,
        /// Last reversed position.
        end: usize,
    },
}

impl Move {
    /// Applies the move and returns the move that undoes it.
    ///
    /// # Panics
    ///
    /// Panics if the move's positions are out of range for `solution`.
    pub fn apply(&self, solution: &mut Solution) -> Move {
        match *self {
            Move::Relocate { from, to } => {
                let source = solution.route(from.route);
                let dropped = (source.len() == 1).then(|| (source.id(), source.vehicle_type()));
                let customer = solution.remove_customer(from.route, from.index);
                let landed = match to {
                    Slot::Existing(p) => {
                        solution.insert_customer(p.route, p.index, customer);
                        p
                    }
                    Slot::NewRoute {
                        vehicle_type,
                        route,
                        id,
                    } => {
                        solution.insert_route(route, id, vehicle_type, vec![customer]);
                        Position::new(route, 0)
                    }
                };
                let back = match dropped {
                    Some((id, vehicle_type)) => Slot::NewRoute {
                        vehicle_type,
                        route: from.route,
                        id: Some(id),
                    },
                    None => Slot::Existing(from),
                };
                Move::Relocate {
                    from: landed,
                    to: back,
                }
            }
            Move::Swap { a, b } => {
                solution.swap_customers((a.route, a.index), (b.route, b.index));
                *self
            }
            Move::TwoOpt { route, start, end } => {
                solution.reverse_segment(route, start, end);
                *self
            }
        }
    }

    /// Route indices, before applying, whose customers the move changes.
    pub fn touched_routes(&self, solution: &Solution) -> Vec<usize> {
        match *self {
            Move::Relocate { from, to } => {
                let mut routes = vec![from.route];
                if let Slot::Existing(p) = to {
                    let source_drops = solution.route(from.route).len() == 1;
                    let target = if source_drops && p.route >= from.route {
                        p.route + 1
                    } else {
                        p.route
                    };
                    if target != from.route {
                        routes.push(target);
                    }
                }
                routes
            }
            Move::Swap { a, b } => {
                if a.route == b.route {
                    vec![a.route]
                } else {
                    vec![a.route, b.route]
                }
            }
            Move::TwoOpt { route, .. } => vec![route],
        }
    }

    /// The customer (location index) a relocation moves.
    pub fn moved_customer(&self, solution: &Solution) -> Option<usize> {
        match *self {
            Move::Relocate { from, .. } => {
                Some(solution.route(from.route).customers()[from.index])
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Fleet, Instance, InstanceBuilder, Point, VehicleType};
    use std::sync::Arc;

    fn instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new("moves");
        for i in 1..=6 {
            let angle = i as f64;
            b.add_customer(Customer::new(
                i,
                Point::new(angle.cos() * 10.0, angle.sin() * 10.0),
                3,
            ))
            .expect("ok");
        }
        b.fleet(Fleet::new(vec![
            VehicleType::new("a", 10, 3),
            VehicleType::new("b", 20, 1),
        ]));
        Arc::new(b.build().expect("valid"))
    }

    fn solution() -> Solution {
        let mut sol = Solution::new(instance());
        sol.open_route(0, vec![1, 2, 3]);
        sol.open_route(0, vec![4]);
        sol.open_route(1, vec![5, 6]);
        sol
    }

    fn roundtrip(mv: Move) {
        let mut sol = solution();
        let before = sol.routes().to_vec();
        let before_cost = sol.total_cost();
        let undo = mv.apply(&mut sol);
        undo.apply(&mut sol);
        assert_eq!(sol.routes(), &before[..]);
        assert!((sol.total_cost() - before_cost).abs() < 1e-10);
    }

    #[test]
    fn test_relocate_between_routes() {
        let mut sol = solution();
        let mv = Move::Relocate {
            from: Position::new(0, 1),
            to: Slot::Existing(Position::new(2, 2)),
        };
        assert_eq!(mv.touched_routes(&sol), vec![0, 2]);
        mv.apply(&mut sol);
        assert_eq!(sol.route(0).customers(), &[1, 3]);
        assert_eq!(sol.route(2).customers(), &[5, 6, 2]);
        roundtrip(mv);
    }

    #[test]
    fn test_relocate_drops_route_and_restores_id() {
        let mut sol = solution();
        let dropped_id = sol.route(1).id();
        // route 1 disappears, so old route 2 is route 1 afterwards
        let mv = Move::Relocate {
            from: Position::new(1, 0),
            to: Slot::Existing(Position::new(1, 0)),
        };
        assert_eq!(mv.touched_routes(&sol), vec![1, 2]);
        let undo = mv.apply(&mut sol);
        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.route(1).customers(), &[4, 5, 6]);
        undo.apply(&mut sol);
        assert_eq!(sol.route(1).id(), dropped_id);
        roundtrip(mv);
    }

    #[test]
    fn test_relocate_within_route() {
        let mv = Move::Relocate {
            from: Position::new(0, 0),
            to: Slot::Existing(Position::new(0, 2)),
        };
        let mut sol = solution();
        assert_eq!(mv.touched_routes(&sol), vec![0]);
        mv.apply(&mut sol);
        assert_eq!(sol.route(0).customers(), &[2, 3, 1]);
        roundtrip(mv);
    }

    #[test]
    fn test_relocate_to_new_route() {
        let mv = Move::Relocate {
            from: Position::new(0, 2),
            to: Slot::NewRoute {
                vehicle_type: 0,
                route: 3,
                id: None,
            },
        };
        let mut sol = solution();
        assert_eq!(mv.touched_routes(&sol), vec![0]);
        mv.apply(&mut sol);
        assert_eq!(sol.num_routes(), 4);
        assert_eq!(sol.route(3).customers(), &[3]);
        roundtrip(mv);
    }

    #[test]
    fn test_swap_and_two_opt_roundtrip() {
        roundtrip(Move::Swap {
            a: Position::new(0, 0),
            b: Position::new(2, 1),
        });
        roundtrip(Move::Swap {
            a: Position::new(0, 0),
            b: Position::new(0, 2),
        });
        roundtrip(Move::TwoOpt {
            route: 0,
            start: 0,
            end: 2,
        });
    }

    #[test]
    fn test_moved_customer() {
        let sol = solution();
        let mv = Move::Relocate {
            from: Position::new(2, 1),
            to: Slot::Existing(Position::new(0, 0)),
        };
        assert_eq!(mv.moved_customer(&sol), Some(6));
        let swap = Move::Swap {
            a: Position::new(0, 0),
            b: Position::new(1, 0),
        };
        assert_eq!(swap.moved_customer(&sol), None);
    }

    mod prop {
        use super::*;
        use crate::local_search::enumerate_moves;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_move_sequence_reverts(picks in proptest::collection::vec(0usize..1000, 1..12)) {
                let mut sol = solution();
                let before = sol.routes().to_vec();
                let before_cost = sol.total_cost();

                let mut undo = Vec::new();
                for p in picks {
                    let moves = enumerate_moves(&sol);
                    if moves.is_empty() {
                        break;
                    }
                    undo.push(moves[p % moves.len()].apply(&mut sol));
                }
                for mv in undo.into_iter().rev() {
                    mv.apply(&mut sol);
                }

                prop_assert_eq!(sol.routes(), &before[..]);
                prop_assert!((sol.total_cost() - before_cost).abs() < 1e-9);
            }
        }
    }
}
