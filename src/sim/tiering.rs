//! Volume tiering and fee assignment.
//!
//! Tier names describe booking volume, not fee level: the `high` tier is the
//! highest-volume bucket (>240 booked days) and ends up with the lowest fee in
//! the optimized schedule, while `low` (≤120 days) carries the highest fee.
//! That inversion is the domain convention and is preserved throughout.

use serde::{Deserialize, Serialize};

use crate::data::Listing;

/// Status-quo flat fee applied to every listing before a schedule change.
pub const BASELINE_FEE: f64 = 0.033;

/// Upper edges of the volume bins: (-1, 120] low, (120, 240] mid, (240, 365] high.
pub const LOW_TIER_MAX_DAYS: f64 = 120.0;
pub const MID_TIER_MAX_DAYS: f64 = 240.0;
pub const BOOKING_HORIZON_DAYS: f64 = 365.0;

/// Quality signals shift when the fee moves away from the baseline: per
/// percentage point of fee delta, each column moves by its coefficient.
const CLEANLINESS_SENSITIVITY: f64 = -0.0003;
const COMMUNICATION_SENSITIVITY: f64 = -0.0018;
const CHECKIN_SENSITIVITY: f64 = -0.002;
const VALUE_SENSITIVITY: f64 = -0.0035;
const REVIEW_COUNT_SENSITIVITY: f64 = -0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Mid, Tier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    /// Classify a booking-day count into its volume tier. The bins are fixed
    /// and cover the whole horizon with no gaps; fractional day counts are
    /// accepted because the scenario surface re-tiers on predicted (continuous)
    /// demand.
    pub fn classify(booked_days: f64) -> Tier {
        if booked_days <= LOW_TIER_MAX_DAYS {
            Tier::Low
        } else if booked_days <= MID_TIER_MAX_DAYS {
            Tier::Mid
        } else {
            Tier::High
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Proposed fee rate per tier. Rates are fractions (0.033 = 3.3%) everywhere
/// inside the crate; percentages exist only at the CLI/HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub high: f64,
    pub mid: f64,
    pub low: f64,
}

impl FeeSchedule {
    pub fn rate_for(&self, tier: Tier) -> f64 {
        match tier {
            Tier::High => self.high,
            Tier::Mid => self.mid,
            Tier::Low => self.low,
        }
    }

    /// Build from percent values (the unit the UI and CLI speak).
    pub fn from_percentages(high: f64, mid: f64, low: f64) -> Self {
        Self {
            high: high / 100.0,
            mid: mid / 100.0,
            low: low / 100.0,
        }
    }

    /// Percent view for presentation boundaries: (high, mid, low).
    pub fn as_percentages(&self) -> (f64, f64, f64) {
        (self.high * 100.0, self.mid * 100.0, self.low * 100.0)
    }
}

/// A listing after tiering and fee assignment. The contained listing is a
/// copy of the raw row with the fee-sensitivity shift applied; the raw table
/// is never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct TieredListing {
    pub listing: Listing,
    pub tier: Tier,
    pub fee_before: f64,
    pub fee_after: f64,
}

/// Tier every listing, assign the baseline and proposed fees, and shift the
/// fee-sensitive quality signals by the fee delta. Schedule rates are clamped
/// at zero. Re-running with the same schedule leaves `tier`, `fee_before` and
/// `fee_after` unchanged (the sensitivity shift accumulates, the tiering does
/// not: it keys off historical `booked` only).
pub fn apply_fee_schedule(listings: &[Listing], schedule: &FeeSchedule) -> Vec<TieredListing> {
    listings
        .iter()
        .map(|listing| {
            let tier = Tier::classify(listing.booked);
            let fee_after = schedule.rate_for(tier).max(0.0);
            let mut adjusted = listing.clone();
            apply_fee_sensitivity(&mut adjusted, fee_after - BASELINE_FEE);
            TieredListing {
                listing: adjusted,
                tier,
                fee_before: BASELINE_FEE,
                fee_after,
            }
        })
        .collect()
}

fn apply_fee_sensitivity(listing: &mut Listing, fee_delta_fraction: f64) {
    let delta_pp = fee_delta_fraction * 100.0;
    listing.review_scores_cleanliness += CLEANLINESS_SENSITIVITY * delta_pp;
    listing.review_scores_communication += COMMUNICATION_SENSITIVITY * delta_pp;
    listing.review_scores_checkin += CHECKIN_SENSITIVITY * delta_pp;
    listing.review_scores_value += VALUE_SENSITIVITY * delta_pp;
    listing.number_of_reviews += REVIEW_COUNT_SENSITIVITY * delta_pp;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Listing;

    fn listing(booked: f64) -> Listing {
        Listing {
            id: 1,
            price: 100.0,
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

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            high: 0.025,
            mid: 0.030,
            low: 0.060,
        }
    }

    #[test]
    fn boundary_days_land_in_documented_bins() {
        assert_eq!(Tier::classify(0.0), Tier::Low);
        assert_eq!(Tier::classify(120.0), Tier::Low);
        assert_eq!(Tier::classify(120.0001), Tier::Mid);
        assert_eq!(Tier::classify(240.0), Tier::Mid);
        assert_eq!(Tier::classify(240.5), Tier::High);
        assert_eq!(Tier::classify(365.0), Tier::High);
    }

    #[test]
    fn every_horizon_day_is_classified() {
        for day in 0..=365 {
            // classify never leaves a listing unbinned
            let _ = Tier::classify(day as f64);
        }
    }

    #[test]
    fn fee_before_is_always_baseline() {
        let listings = vec![listing(10.0), listing(200.0), listing(300.0)];
        let tiered = apply_fee_schedule(&listings, &schedule());
        assert!(tiered.iter().all(|t| t.fee_before == BASELINE_FEE));
    }

    #[test]
    fn fee_after_follows_tier_lookup() {
        let listings = vec![listing(10.0), listing(200.0), listing(300.0)];
        let tiered = apply_fee_schedule(&listings, &schedule());
        assert_eq!(tiered[0].tier, Tier::Low);
        assert_eq!(tiered[0].fee_after, 0.060);
        assert_eq!(tiered[1].tier, Tier::Mid);
        assert_eq!(tiered[1].fee_after, 0.030);
        assert_eq!(tiered[2].tier, Tier::High);
        assert_eq!(tiered[2].fee_after, 0.025);
    }

    #[test]
    fn negative_schedule_rate_is_clamped_to_zero() {
        let listings = vec![listing(300.0)];
        let tiered = apply_fee_schedule(
            &listings,
            &FeeSchedule {
                high: -0.01,
                mid: 0.02,
                low: 0.03,
            },
        );
        assert_eq!(tiered[0].fee_after, 0.0);
    }

    #[test]
    fn reapplying_same_schedule_keeps_tier_and_fees() {
        let listings = vec![listing(119.0), listing(241.0)];
        let first = apply_fee_schedule(&listings, &schedule());
        let inner: Vec<Listing> = first.iter().map(|t| t.listing.clone()).collect();
        let second = apply_fee_schedule(&inner, &schedule());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.tier, b.tier);
            assert_eq!(a.fee_before, b.fee_before);
            assert_eq!(a.fee_after, b.fee_after);
        }
    }

    #[test]
    fn sensitivity_shift_moves_quality_signals_with_fee_delta() {
        let listings = vec![listing(10.0)];
        // low tier rate 0.060 → delta +2.7pp
        let tiered = apply_fee_schedule(&listings, &schedule());
        let adjusted = &tiered[0].listing;
        let delta_pp = (0.060 - BASELINE_FEE) * 100.0;
        assert!((adjusted.number_of_reviews - (30.0 + -0.002 * delta_pp)).abs() < 1e-12);
        assert!(
            (adjusted.review_scores_value - (4.6 + -0.0035 * delta_pp)).abs() < 1e-12
        );
    }

    #[test]
    fn percent_conversion_round_trips() {
        let schedule = FeeSchedule::from_percentages(2.5, 3.0, 6.0);
        assert!((schedule.high - 0.025).abs() < 1e-12);
        let (high, mid, low) = schedule.as_percentages();
        assert!((high - 2.5).abs() < 1e-9);
        assert!((mid - 3.0).abs() < 1e-9);
        assert!((low - 6.0).abs() < 1e-9);
    }
}
