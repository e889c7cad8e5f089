//! Error taxonomy for instance construction and solving.
//!
//! Only malformed input, unserviceable customers, and unknown algorithm
//! selectors abort a solve. Constraint violations are values
//! ([`Validation`](crate::constraints::Validation)) and configuration problems
//! are [`ConfigWarning`]s; neither is ever returned as an error.

use std::fmt;

/// Why no vehicle can ever serve part of an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum InfeasibleKind {
    /// A customer's demand exceeds every vehicle type's capacity.
    UnassignableCustomer {
        /// External customer id.
        customer: usize,
        /// Demand of the customer.
        demand: i32,
        /// Largest capacity in the fleet.
        max_capacity: i32,
    },
    /// The fleet has no vehicle types.
    EmptyFleet,
}

/// Fatal errors raised before or at the start of a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// Malformed input data.
    InvalidInstance(String),
    /// Some customer can never be served.
    Infeasible(InfeasibleKind),
    /// Unrecognized algorithm selector.
    UnknownAlgorithm(String),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidInstance(msg) => write!(f, "invalid instance: {msg}"),
            RoutingError::Infeasible(InfeasibleKind::UnassignableCustomer {
                customer,
                demand,
                max_capacity,
            }) => write!(
                f,
                "infeasible: customer {customer} has demand {demand} above the largest capacity {max_capacity}"
            ),
            RoutingError::Infeasible(InfeasibleKind::EmptyFleet) => {
                write!(f, "infeasible: fleet has no vehicle types")
            }
            RoutingError::UnknownAlgorithm(name) => write!(
                f,
                "unknown algorithm '{name}' (expected greedy, savings, simulated_annealing or tabu_search)"
            ),
        }
    }
}

impl std::error::Error for RoutingError {}

/// A non-fatal configuration problem. The offending option falls back to its
/// default value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    /// Option name as supplied by the caller.
    pub option: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ConfigWarning {
    /// Creates a warning for the given option.
    pub fn new(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option '{}': {}", self.option, self.message)
    }
}
