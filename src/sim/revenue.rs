//! Revenue aggregation before/after a fee change.
//!
//! Baseline platform revenue applies the flat 3.3% fee to observed bookings;
//! simulated platform revenue applies each listing's tier fee to predicted
//! bookings. All fee rates are fractions here.

use serde::Serialize;

use crate::model::PredictedListing;
use crate::sim::tiering::Tier;

/// Aggregate platform revenue comparison plus per-listing sales (the fee take
/// per listing, aligned with the input rows).
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub sales: Vec<f64>,
    pub original_total: f64,
    pub simulated_total: f64,
    /// None when the baseline revenue is zero; the change is undefined then,
    /// never a silent infinity.
    pub revenue_change_pct: Option<f64>,
}

/// Platform and host totals used by the grid search's acceptance rule.
/// Host revenue is listing revenue minus the platform's fee take.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketTotals {
    pub original_host: f64,
    pub simulated_host: f64,
    pub simulated_platform: f64,
}

/// Per-tier slice of the simulated outcome for presentation surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct TierBreakdown {
    pub tier: Tier,
    pub listings: usize,
    pub sales: f64,
}

/// Compute the revenue comparison over predicted rows:
/// `original = Σ price·booked·fee_before`, `simulated = Σ price·booked_new·fee_after`.
pub fn calculate_revenue(rows: &[PredictedListing]) -> RevenueReport {
    let mut sales = Vec::with_capacity(rows.len());
    let mut original_total = 0.0;
    let mut simulated_total = 0.0;

    for predicted in rows {
        let tiered = &predicted.row;
        let listing = &tiered.listing;
        let sale = listing.price * predicted.booked_new * tiered.fee_after;
        sales.push(sale);
        original_total += listing.price * listing.booked * tiered.fee_before;
        simulated_total += sale;
    }

    let revenue_change_pct = if original_total == 0.0 {
        None
    } else {
        Some((simulated_total - original_total) / original_total * 100.0)
    };

    RevenueReport {
        sales,
        original_total,
        simulated_total,
        revenue_change_pct,
    }
}

/// Host/platform totals for the search's acceptance rule.
pub fn market_totals(rows: &[PredictedListing]) -> MarketTotals {
    let mut original_host = 0.0;
    let mut simulated_host = 0.0;
    let mut simulated_platform = 0.0;

    for predicted in rows {
        let tiered = &predicted.row;
        let listing = &tiered.listing;

        let original_revenue = listing.price * listing.booked;
        original_host += original_revenue * (1.0 - tiered.fee_before);

        let simulated_revenue = listing.price * predicted.booked_new;
        let fee_take = simulated_revenue * tiered.fee_after;
        simulated_platform += fee_take;
        simulated_host += simulated_revenue - fee_take;
    }

    MarketTotals {
        original_host,
        simulated_host,
        simulated_platform,
    }
}

/// Simulated sales and listing counts grouped by volume tier.
pub fn sales_by_tier(rows: &[PredictedListing], sales: &[f64]) -> Vec<TierBreakdown> {
    Tier::ALL
        .iter()
        .map(|tier| {
            let mut listings = 0;
            let mut tier_sales = 0.0;
            for (predicted, sale) in rows.iter().zip(sales) {
                if predicted.row.tier == *tier {
                    listings += 1;
                    tier_sales += sale;
                }
            }
            TierBreakdown {
                tier: *tier,
                listings,
                sales: tier_sales,
            }
        })
        .collect()
}
