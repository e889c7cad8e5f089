//! Time-dependent travel-time multipliers.

use serde::{Deserialize, Serialize};

/// Hourly factors for a typical urban weekday, starting at midnight.
const URBAN_DAY: [f64; 24] = [
    0.8, 0.8, 0.8, 0.8, 0.8, 0.9, // night
    1.0, 1.4, 1.6, 1.3, // morning rush
    1.1, 1.0, 1.2, 1.1, // late morning, lunch
    1.0, 1.0, 1.1, // afternoon
    1.5, 1.7, 1.4, // evening rush
    1.2, 1.0, 0.9, 0.8,
];

/// A cyclic table of travel-time multipliers.
///
/// Departure time `t` falls into slot `floor(t / slot_duration) mod len`.
/// The default profile is the constant 1.0, under which travel time equals
/// distance.
///
/// # Examples
///
/// ```
/// use u_ecoroute::distance::TrafficProfile;
///
/// let identity = TrafficProfile::identity();
/// assert_eq!(identity.factor_at(123.4), 1.0);
///
/// let rush = TrafficProfile::urban_day();
/// assert_eq!(rush.factor_at(18.5), 1.7);
/// assert_eq!(rush.factor_at(24.0 + 18.5), 1.7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficProfile {
    slot_duration: f64,
    factors: Vec<f64>,
}

impl TrafficProfile {
    /// Constant multiplier 1.0.
    pub fn identity() -> Self {
        Self {
            slot_duration: 1.0,
            factors: vec![1.0],
        }
    }

    /// Builds a profile from slot length and per-slot factors.
    ///
    /// Returns `None` for a non-positive slot length, an empty table, or any
    /// non-finite or non-positive factor.
    pub fn new(slot_duration: f64, factors: Vec<f64>) -> Option<Self> {
        if !slot_duration.is_finite() || slot_duration <= 0.0 || factors.is_empty() {
            return None;
        }
        if factors.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return None;
        }
        Some(Self {
            slot_duration,
            factors,
        })
    }

    /// 24 hourly slots with rush-hour peaks at 8h and 18h.
    pub fn urban_day() -> Self {
        Self {
            slot_duration: 1.0,
            factors: URBAN_DAY.to_vec(),
        }
    }

    /// Multiplier for a departure at `time`.
    pub fn factor_at(&self, time: f64) -> f64 {
        if self.factors.len() == 1 {
            return self.factors[0];
        }
        let slot = (time.max(0.0) / self.slot_duration).floor() as usize;
        self.factors[slot % self.factors.len()]
    }

    /// Returns `true` if every slot is exactly 1.0.
    pub fn is_identity(&self) -> bool {
        self.factors.iter().all(|&f| f == 1.0)
    }

    /// Slot length.
    pub fn slot_duration(&self) -> f64 {
        self.slot_duration
    }

    /// Per-slot factors.
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self::identity()
    }
}
