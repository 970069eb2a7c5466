//! Feature derivation for the demand model.
//!
//! Every engineered feature is a pure function of one listing row, except
//! `is_popular`, which compares against the batch mean of `number_of_reviews`.
//! The mean is passed in as an explicit scalar so row derivation stays
//! deterministic and testable; callers recompute it fresh for every batch
//! (grid-search candidates shift `number_of_reviews`, so a stale mean would
//! leak one candidate's state into another).

use crate::data::Listing;
use crate::sim::tiering::TieredListing;

/// Model-ready column order. The target (`booked`), the identifier and the
/// tiering/fee columns are excluded; the proposed fee reaches the model
/// through the fee-sensitivity shift of the quality signals.
pub const FEATURE_COLUMNS: &[&str] = &[
    // raw listing columns
    "price",
    "host_response_rate",
    "host_acceptance_rate",
    "host_is_superhost",
    "instant_bookable",
    "number_of_reviews",
    "number_of_reviews_ltm",
    "reviews_per_month",
    "accommodates",
    "bedrooms",
    "review_scores_cleanliness",
    "review_scores_communication",
    "review_scores_checkin",
    "review_scores_value",
    "has_basic_score",
    "has_safety_score",
    "has_hygiene_score",
    "has_cooking_score",
    "has_sleep_score",
    "has_appliances_score",
    "has_work_score",
    "has_checkin_score",
    "has_pet_score",
    "has_longterm_score",
    // engineered columns
    "host_response_gap",
    "review_density",
    "recent_review_ratio",
    "host_activity_score",
    "reviews_x_beds",
    "acceptance_per_bed",
    "monthly_review_score",
    "sleep_x_work",
    "log_reviews",
    "log_beds",
    "log_accommodates",
    "is_popular",
    "size_category",
    "bedroom_category",
    "is_premium",
    "log_checkin_score",
    "log_longterm_score",
    "avg_facility_score",
    "sum_facility_score",
];

/// Engineered per-listing features. Ratios carry additive epsilon guards so a
/// zero denominator never divides by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub host_response_gap: f64,
    pub review_density: f64,
    pub recent_review_ratio: f64,
    pub host_activity_score: f64,
    pub reviews_x_beds: f64,
    pub acceptance_per_bed: f64,
    pub monthly_review_score: f64,
    pub sleep_x_work: f64,
    pub log_reviews: f64,
    pub log_beds: f64,
    pub log_accommodates: f64,
    pub is_popular: f64,
    pub size_category: f64,
    pub bedroom_category: f64,
    pub is_premium: f64,
    pub log_checkin_score: f64,
    pub log_longterm_score: f64,
    pub avg_facility_score: f64,
    pub sum_facility_score: f64,
}

impl DerivedFeatures {
    /// Derive the engineered columns for one listing. `mean_reviews` is the
    /// batch mean of `number_of_reviews` (see module docs).
    pub fn derive(listing: &Listing, mean_reviews: f64) -> Self {
        let facility = facility_scores(listing);
        let facility_sum: f64 = facility.iter().sum();

        Self {
            host_response_gap: listing.host_response_rate - listing.host_acceptance_rate,
            review_density: listing.number_of_reviews / (listing.accommodates + 1e-5),
            recent_review_ratio: listing.number_of_reviews_ltm / (listing.number_of_reviews + 1.0),
            host_activity_score: listing.host_response_rate * listing.host_is_superhost,
            reviews_x_beds: listing.number_of_reviews * listing.bedrooms,
            acceptance_per_bed: listing.host_acceptance_rate / (listing.bedrooms + 1.0),
            monthly_review_score: listing.reviews_per_month * listing.has_hygiene_score,
            sleep_x_work: listing.has_sleep_score * listing.has_work_score,
            log_reviews: listing.number_of_reviews.ln_1p(),
            log_beds: listing.bedrooms.ln_1p(),
            log_accommodates: listing.accommodates.ln_1p(),
            is_popular: binary_flag(listing.number_of_reviews > mean_reviews),
            size_category: size_category(listing.accommodates),
            bedroom_category: bedroom_category(listing.bedrooms),
            is_premium: binary_flag(
                listing.host_is_superhost == 1.0 && listing.instant_bookable == 1.0,
            ),
            log_checkin_score: listing.has_checkin_score.ln_1p(),
            log_longterm_score: listing.has_longterm_score.ln_1p(),
            avg_facility_score: facility_sum / facility.len() as f64,
            sum_facility_score: facility_sum,
        }
    }
}

fn binary_flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn facility_scores(listing: &Listing) -> [f64; 10] {
    [
        listing.has_basic_score,
        listing.has_safety_score,
        listing.has_hygiene_score,
        listing.has_cooking_score,
        listing.has_sleep_score,
        listing.has_appliances_score,
        listing.has_work_score,
        listing.has_checkin_score,
        listing.has_pet_score,
        listing.has_longterm_score,
    ]
}

/// Accommodates bucket: (0, 2] → 0, (2, 4] → 1, (4, 10] → 2, above → 3.
/// The lowest bucket absorbs everything at or below its upper edge so no
/// value is left unbinned.
fn size_category(accommodates: f64) -> f64 {
    if accommodates <= 2.0 {
        0.0
    } else if accommodates <= 4.0 {
        1.0
    } else if accommodates <= 10.0 {
        2.0
    } else {
        3.0
    }
}

/// Bedrooms bucket: (-0.1, 1] → 0 (studio), (1, 2] → 1, (2, 3] → 2, above → 3.
fn bedroom_category(bedrooms: f64) -> f64 {
    if bedrooms <= 1.0 {
        0.0
    } else if bedrooms <= 2.0 {
        1.0
    } else if bedrooms <= 3.0 {
        2.0
    } else {
        3.0
    }
}

/// Batch mean of `number_of_reviews`, computed fresh per prediction batch.
pub fn population_mean_reviews(rows: &[TieredListing]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|r| r.listing.number_of_reviews).sum::<f64>() / rows.len() as f64
}

/// Assemble the model-ready matrix in [FEATURE_COLUMNS] order.
pub fn feature_matrix(rows: &[TieredListing], mean_reviews: f64) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| feature_vector(&row.listing, mean_reviews))
        .collect()
}

fn feature_vector(listing: &Listing, mean_reviews: f64) -> Vec<f64> {
    let derived = DerivedFeatures::derive(listing, mean_reviews);
    let vector = vec![
        listing.price,
        listing.host_response_rate,
        listing.host_acceptance_rate,
        listing.host_is_superhost,
        listing.instant_bookable,
        listing.number_of_reviews,
        listing.number_of_reviews_ltm,
        listing.reviews_per_month,
        listing.accommodates,
        listing.bedrooms,
        listing.review_scores_cleanliness,
        listing.review_scores_communication,
        listing.review_scores_checkin,
        listing.review_scores_value,
        listing.has_basic_score,
        listing.has_safety_score,
        listing.has_hygiene_score,
        listing.has_cooking_score,
        listing.has_sleep_score,
        listing.has_appliances_score,
        listing.has_work_score,
        listing.has_checkin_score,
        listing.has_pet_score,
        listing.has_longterm_score,
        derived.host_response_gap,
        derived.review_density,
        derived.recent_review_ratio,
        derived.host_activity_score,
        derived.reviews_x_beds,
        derived.acceptance_per_bed,
        derived.monthly_review_score,
        derived.sleep_x_work,
        derived.log_reviews,
        derived.log_beds,
        derived.log_accommodates,
        derived.is_popular,
        derived.size_category,
        derived.bedroom_category,
        derived.is_premium,
        derived.log_checkin_score,
        derived.log_longterm_score,
        derived.avg_facility_score,
        derived.sum_facility_score,
    ];
    debug_assert_eq!(vector.len(), FEATURE_COLUMNS.len());
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tiering::{apply_fee_schedule, FeeSchedule};

    fn listing(id: u64, reviews: f64) -> Listing {
        Listing {
            id,
            price: 100.0,
            booked: 100.0,
            host_response_rate: 0.9,
            host_acceptance_rate: 0.8,
            host_is_superhost: 1.0,
            instant_bookable: 1.0,
            number_of_reviews: reviews,
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
    fn derivation_is_deterministic() {
        let l = listing(1, 30.0);
        let a = DerivedFeatures::derive(&l, 20.0);
        let b = DerivedFeatures::derive(&l, 20.0);
        assert_eq!(a, b);
    }

    #[test]
    fn is_popular_compares_against_batch_mean() {
        let l = listing(1, 30.0);
        assert_eq!(DerivedFeatures::derive(&l, 29.9).is_popular, 1.0);
        assert_eq!(DerivedFeatures::derive(&l, 30.0).is_popular, 0.0);
        assert_eq!(DerivedFeatures::derive(&l, 31.0).is_popular, 0.0);
    }

    #[test]
    fn ratio_guards_survive_zero_denominators() {
        let mut l = listing(1, 0.0);
        l.accommodates = 0.0;
        l.bedrooms = 0.0;
        l.number_of_reviews_ltm = 0.0;
        let derived = DerivedFeatures::derive(&l, 5.0);
        assert!(derived.review_density.is_finite());
        assert!(derived.recent_review_ratio.is_finite());
        assert!(derived.acceptance_per_bed.is_finite());
    }

    #[test]
    fn bucket_edges_match_documented_bins() {
        assert_eq!(size_category(0.0), 0.0);
        assert_eq!(size_category(2.0), 0.0);
        assert_eq!(size_category(2.5), 1.0);
        assert_eq!(size_category(4.0), 1.0);
        assert_eq!(size_category(10.0), 2.0);
        assert_eq!(size_category(11.0), 3.0);

        assert_eq!(bedroom_category(0.0), 0.0);
        assert_eq!(bedroom_category(1.0), 0.0);
        assert_eq!(bedroom_category(2.0), 1.0);
        assert_eq!(bedroom_category(3.0), 2.0);
        assert_eq!(bedroom_category(4.0), 3.0);
    }

    #[test]
    fn facility_aggregates_use_all_ten_scores() {
        let l = listing(1, 30.0);
        let derived = DerivedFeatures::derive(&l, 0.0);
        assert_eq!(derived.sum_facility_score, 7.0);
        assert!((derived.avg_facility_score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn matrix_width_matches_declared_columns() {
        let listings = vec![listing(1, 30.0), listing(2, 5.0)];
        let tiered = apply_fee_schedule(
            &listings,
            &FeeSchedule {
                high: 0.025,
                mid: 0.03,
                low: 0.06,
            },
        );
        let mean = population_mean_reviews(&tiered);
        let matrix = feature_matrix(&tiered, mean);
        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == FEATURE_COLUMNS.len()));
    }

    #[test]
    fn population_mean_is_recomputed_from_the_given_batch() {
        let listings = vec![listing(1, 10.0), listing(2, 30.0)];
        let tiered = apply_fee_schedule(
            &listings,
            &FeeSchedule {
                high: 0.033,
                mid: 0.033,
                low: 0.033,
            },
        );
        // schedule equals the baseline, so the sensitivity shift is zero
        assert!((population_mean_reviews(&tiered) - 20.0).abs() < 1e-12);
        assert_eq!(population_mean_reviews(&[]), 0.0);
    }
}
