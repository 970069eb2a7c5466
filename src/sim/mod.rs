//! Simulation pipeline: tiering → feature derivation + demand prediction →
//! revenue aggregation. One run is a pure function of the raw table, the fee
//! schedule and the loaded model; nothing is cached across runs.

pub mod features;
pub mod revenue;
pub mod tiering;

use serde::Serialize;

use crate::data::Listing;
use crate::model::{DemandModel, PredictedListing};
use crate::sim::revenue::{calculate_revenue, RevenueReport};
use crate::sim::tiering::{apply_fee_schedule, FeeSchedule, Tier};

pub use crate::sim::tiering::{BASELINE_FEE, BOOKING_HORIZON_DAYS};

/// Augmented rows plus the revenue comparison for one fee schedule.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub rows: Vec<PredictedListing>,
    pub report: RevenueReport,
}

/// Run the full pipeline for one schedule. The raw table is only borrowed;
/// every run builds its own augmented copy, so callers (the grid search in
/// particular) can evaluate many schedules against one snapshot.
pub fn simulate(
    model: &DemandModel,
    listings: &[Listing],
    schedule: &FeeSchedule,
) -> SimulationOutcome {
    let tiered = apply_fee_schedule(listings, schedule);
    let rows = model.predict_booked_days(&tiered);
    let report = calculate_revenue(&rows);
    SimulationOutcome { rows, report }
}

/// Host-scenario view of one predicted row: the tier is re-derived from
/// predicted demand and the predicted days are truncated to whole days.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScenarioQuote {
    pub predicted_days: i64,
    pub tier: Tier,
    pub fee_rate: f64,
}

/// Quote the fee a host would see next period: re-tier on `booked_new` and
/// look the rate up in the same schedule. Truncates toward zero, not
/// round-half-even.
pub fn scenario_quote(predicted: &PredictedListing, schedule: &FeeSchedule) -> ScenarioQuote {
    let tier = Tier::classify(predicted.booked_new);
    ScenarioQuote {
        predicted_days: predicted.booked_new.trunc() as i64,
        tier,
        fee_rate: schedule.rate_for(tier).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DemandModel, Regressor, ScalerParams};
    use crate::sim::features::FEATURE_COLUMNS;

    fn constant_model(value: f64) -> DemandModel {
        DemandModel::Single {
            scaler: ScalerParams {
                mean: vec![0.0; FEATURE_COLUMNS.len()],
                scale: vec![1.0; FEATURE_COLUMNS.len()],
            },
            model: Regressor::Linear {
                coefficients: vec![0.0; FEATURE_COLUMNS.len()],
                intercept: value,
            },
        }
    }

    fn listing(id: u64, booked: f64, price: f64) -> Listing {
        Listing {
            id,
            price,
            booked,
            host_response_rate: 0.9,
            host_acceptance_rate: 0.8,
            host_is_superhost: 1.0,
            instant_bookable: 1.0,
            number_of_reviews: 30.0,
            number_of_reviews_ltm: 10.0,
            reviews_per_month: 1.5,
            accommodates: 4.0,
            bedrooms: 2.0,
            review_scores_cleanliness: 4.5,
            review_scores_communication: 4.8,
            review_scores_checkin: 4.7,
            review_scores_value: 4.6,
            has_basic_score: 1.0,
            has_safety_score: 1.0,
            has_hygiene_score: 1.0,
            has_cooking_score: 0.0,
            has_sleep_score: 1.0,
            has_appliances_score: 1.0,
            has_work_score: 0.0,
            has_checkin_score: 1.0,
            has_pet_score: 0.0,
            has_longterm_score: 1.0,
        }
    }

    #[test]
    fn simulate_leaves_the_input_table_untouched() {
        let listings = vec![listing(1, 100.0, 120.0), listing(2, 300.0, 80.0)];
        let before = listings.clone();
        let schedule = FeeSchedule {
            high: 0.025,
            mid: 0.03,
            low: 0.06,
        };
        let outcome = simulate(&constant_model(150.0), &listings, &schedule);
        assert_eq!(listings, before);
        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.rows.iter().all(|r| r.booked_new == 150.0));
    }

    #[test]
    fn scenario_quote_truncates_and_retiers_on_predicted_demand() {
        let listings = vec![listing(1, 30.0, 100.0)];
        let schedule = FeeSchedule {
            high: 0.024,
            mid: 0.033,
            low: 0.055,
        };
        // booked 30 → low tier today, but predicted 205.7 days → mid tier
        let outcome = simulate(&constant_model(205.7), &listings, &schedule);
        let quote = scenario_quote(&outcome.rows[0], &schedule);
        assert_eq!(quote.predicted_days, 205);
        assert_eq!(quote.tier, Tier::Mid);
        assert!((quote.fee_rate - 0.033).abs() < 1e-12);
    }
}
