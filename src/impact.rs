//! Environmental impact of an optimized plan against a baseline.
//!
//! Pure post-processing: nothing here feeds back into the search.

use serde::{Deserialize, Serialize};

use crate::models::Solution;

/// Conversion factors from distance to emissions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    /// kg CO₂ emitted per distance unit.
    pub co2_per_distance: f64,
    /// kg CO₂ emitted per litre of fuel burnt.
    pub co2_per_litre: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            co2_per_distance: 0.2,
            co2_per_litre: 2.3,
        }
    }
}

/// Savings of an optimized plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactReport {
    /// Baseline distance.
    pub baseline_distance: f64,
    /// Optimized distance.
    pub optimized_distance: f64,
    /// `baseline - optimized`; negative when the plan is longer.
    pub distance_saved: f64,
    /// Saved distance as a percentage of the baseline (0 for a baseline ≤ 0).
    pub reduction_percent: f64,
    /// CO₂ emitted by the optimized plan, kg.
    pub co2_emitted_kg: f64,
    /// CO₂ avoided, kg.
    pub co2_saved_kg: f64,
    /// Fuel avoided, litres.
    pub fuel_saved_litres: f64,
}

/// Compares an optimized distance with a baseline distance.
///
/// # Examples
///
/// ```
/// use u_ecoroute::impact::{assess, EmissionFactors};
///
/// let report = assess(1000.0, 850.0, EmissionFactors::default());
/// assert!((report.reduction_percent - 15.0).abs() < 1e-9);
/// assert!((report.co2_saved_kg - 30.0).abs() < 1e-9);
/// assert!((report.fuel_saved_litres - 30.0 / 2.3).abs() < 1e-9);
/// ```
pub fn assess(baseline: f64, optimized: f64, factors: EmissionFactors) -> ImpactReport {
    let distance_saved = baseline - optimized;
    let reduction_percent = if baseline > 0.0 {
        distance_saved / baseline * 100.0
    } else {
        0.0
    };
    let co2_saved_kg = distance_saved * factors.co2_per_distance;
    let fuel_saved_litres = if factors.co2_per_litre > 0.0 {
        co2_saved_kg / factors.co2_per_litre
    } else {
        0.0
    };
    ImpactReport {
        baseline_distance: baseline,
        optimized_distance: optimized,
        distance_saved,
        reduction_percent,
        co2_emitted_kg: optimized * factors.co2_per_distance,
        co2_saved_kg,
        fuel_saved_litres,
    }
}

/// [`assess`] on the total distances of two solutions.
pub fn assess_solutions(
    baseline: &Solution,
    optimized: &Solution,
    factors: EmissionFactors,
) -> ImpactReport {
    assess(baseline.total_distance(), optimized.total_distance(), factors)
}
