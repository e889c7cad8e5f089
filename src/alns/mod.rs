//! Destroy/repair contract for large-neighborhood search.
//!
//! Only the operator interfaces live here; the crate ships no operator
//! library and no adaptive driver. A destroy operator removes customers
//! from a solution, and a repair operator puts them back:
//!
//! ```text
//! destroy(solution)        -> partial solution + removed customers
//! repair(partial, removed) -> solution
//! ```
//!
//! # Reference
//!
//! Ropke, S. & Pisinger, D. (2006). "An Adaptive Large Neighborhood Search
//! Heuristic for the Pickup and Delivery Problem with Time Windows",
//! *Transportation Science* 40(4), 455-472.

use rand::Rng;

use crate::models::Solution;

/// A partially destroyed solution.
#[derive(Debug, Clone)]
pub struct Destroyed {
    /// The solution with customers taken out.
    pub partial: Solution,
    /// Removed customers (location indices), in removal order.
    pub removed: Vec<usize>,
}

/// Removes customers from a solution.
pub trait DestroyOperator: Send + Sync {
    /// Human-readable operator name.
    fn name(&self) -> &str;

    /// Removes some customers. The input solution is left untouched.
    fn destroy<R: Rng>(&self, solution: &Solution, rng: &mut R) -> Destroyed;
}

/// Reinserts removed customers.
pub trait RepairOperator: Send + Sync {
    /// Human-readable operator name.
    fn name(&self) -> &str;

    /// Inserts `removed` into `partial`, returning a complete solution.
    fn repair<R: Rng>(&self, partial: Solution, removed: Vec<usize>, rng: &mut R) -> Solution;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintSet;
    use crate::models::{Customer, Fleet, InstanceBuilder, Point, DEPOT};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    struct DropRandom(usize);

    impl DestroyOperator for DropRandom {
        fn name(&self) -> &str {
            "drop_random"
        }

        fn destroy<R: Rng>(&self, solution: &Solution, rng: &mut R) -> Destroyed {
            let mut partial = solution.clone();
            let mut removed = Vec::new();
            for _ in 0..self.0 {
                if partial.num_routes() == 0 {
                    break;
                }
                let r = rng.random_range(0..partial.num_routes());
                let i = rng.random_range(0..partial.route(r).len());
                removed.push(partial.remove_customer(r, i));
            }
            Destroyed { partial, removed }
        }
    }

    struct CheapestEnd;

    impl RepairOperator for CheapestEnd {
        fn name(&self) -> &str {
            "cheapest_end"
        }

        fn repair<R: Rng>(&self, mut partial: Solution, removed: Vec<usize>, _rng: &mut R) -> Solution {
            for c in removed {
                let inst = partial.shared_instance();
                let best = (0..partial.num_routes()).min_by(|&a, &b| {
                    let cost = |r: usize| {
                        let end = *partial.route(r).customers().last().unwrap_or(&DEPOT);
                        inst.distance(end, c) + inst.distance(c, DEPOT) - inst.distance(end, DEPOT)
                    };
                    cost(a).total_cmp(&cost(b))
                });
                match best {
                    Some(r) => {
                        let len = partial.route(r).len();
                        partial.insert_customer(r, len, c);
                    }
                    None => {
                        partial.open_route(0, vec![c]);
                    }
                }
            }
            partial
        }
    }

    #[test]
    fn test_destroy_repair_contract() {
        let mut b = InstanceBuilder::new("lns");
        for i in 1..=6 {
            b.add_customer(Customer::new(i, Point::new(i as f64, 1.0), 1))
                .expect("ok");
        }
        b.fleet(Fleet::homogeneous(100, 2));
        let mut sol = Solution::new(Arc::new(b.build().expect("valid")));
        sol.open_route(0, vec![1, 2, 3]);
        sol.open_route(0, vec![4, 5, 6]);

        let mut rng = StdRng::seed_from_u64(17);
        let destroyed = DropRandom(3).destroy(&sol, &mut rng);
        assert_eq!(destroyed.removed.len(), 3);
        assert_eq!(destroyed.partial.served_count(), 3);
        assert_eq!(sol.served_count(), 6);

        let repaired = CheapestEnd.repair(destroyed.partial, destroyed.removed, &mut rng);
        assert_eq!(repaired.served_count(), 6);
        assert!(ConstraintSet::default().evaluate(&repaired).feasible);
    }
}
