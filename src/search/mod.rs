//! Fee grid search: sweep the fee space for the schedule that maximizes
//! platform revenue without shrinking host revenue.
//!
//! Candidates are `(short, mid, long)` rate triples over a fixed step grid.
//! The stay-length variable names map inversely onto the volume-tier labels:
//! the `short` rate goes to the `high` (highest-volume) tier and the `long`
//! rate to the `low` tier. Candidates are indexed in enumeration order and
//! the results folded in that order, so ties on platform revenue keep the
//! earliest triple no matter how the parallel sweep schedules work.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use crate::data::Listing;
use crate::model::DemandModel;
use crate::sim::revenue::market_totals;
use crate::sim::simulate;
use crate::sim::tiering::FeeSchedule;

/// Hard cap on the mid-tier rate: never above the status-quo flat fee.
pub const MID_FEE_CAP: f64 = 0.033;

/// A candidate must grow aggregate host revenue by at least this much.
pub const MIN_HOST_GAIN_PCT: f64 = 1.5;

/// Number of progress batches for the progress-reporting sweep (UI jobs).
const SEARCH_PROGRESS_BATCH_COUNT: usize = 20;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Grid step for each of the three rates, as a fraction.
    pub fee_step: f64,
    /// Inclusive upper bound of the grid, as a fraction.
    pub fee_max: f64,
    /// Best-effort wall-clock limit. Candidates not yet evaluated when it
    /// expires are skipped and counted; the best evaluated candidate still
    /// wins.
    pub deadline: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fee_step: 0.005,
            fee_max: 0.06,
            deadline: None,
        }
    }
}

/// The accepted optimum and the totals that justified it.
#[derive(Debug, Clone, Serialize)]
pub struct BestFee {
    pub schedule: FeeSchedule,
    pub platform_revenue: f64,
    pub host_revenue: f64,
    pub host_gain_pct: f64,
}

/// Sweep result. `best` is None when no triple satisfies both constraints;
/// callers must branch on that instead of assuming a schedule exists.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub best: Option<BestFee>,
    pub candidates_total: usize,
    pub candidates_evaluated: usize,
    pub candidates_skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct CandidateResult {
    schedule: FeeSchedule,
    platform_revenue: f64,
    host_revenue: f64,
    /// None when the original host revenue is zero; the comparison is
    /// undefined and the candidate is rejected.
    host_gain_pct: Option<f64>,
}

/// All valid `(short, mid, long)` triples in enumeration order: `long` is the
/// outer loop, `short` the inner, each ascending. Only strictly ordered
/// triples (`short < mid < long`) under the mid cap survive.
pub fn enumerate_candidates(config: &SearchConfig) -> Vec<FeeSchedule> {
    let grid = grid_values(config.fee_step, config.fee_max);
    let mut candidates = Vec::new();
    for &long in &grid {
        for &mid in &grid {
            if mid >= long || mid > MID_FEE_CAP {
                continue;
            }
            for &short in &grid {
                if short >= mid {
                    continue;
                }
                candidates.push(FeeSchedule {
                    high: short,
                    mid,
                    low: long,
                });
            }
        }
    }
    candidates
}

fn grid_values(step: f64, max: f64) -> Vec<f64> {
    if step <= 0.0 || max < 0.0 {
        return Vec::new();
    }
    // Multiply the index instead of accumulating so the last grid point lands
    // exactly on the bound.
    let steps = ((max + 1e-9) / step) as usize;
    (0..=steps).map(|i| i as f64 * step).collect()
}

/// Exhaustive parallel sweep with the acceptance rule: host revenue must grow
/// by at least [MIN_HOST_GAIN_PCT] percent and platform revenue must strictly
/// exceed the best found so far (first-found wins on ties).
pub fn grid_search_optimal_fee(
    model: &DemandModel,
    listings: &[Listing],
    config: &SearchConfig,
) -> SearchOutcome {
    grid_search_with_progress(model, listings, config, |_, _| {})
}

/// Like [grid_search_optimal_fee] but runs the sweep in batches and invokes
/// `on_progress(done, total)` after each batch.
pub fn grid_search_with_progress<F>(
    model: &DemandModel,
    listings: &[Listing],
    config: &SearchConfig,
    mut on_progress: F,
) -> SearchOutcome
where
    F: FnMut(usize, usize),
{
    let candidates = enumerate_candidates(config);
    let total = candidates.len();
    if total == 0 {
        return SearchOutcome {
            best: None,
            candidates_total: 0,
            candidates_evaluated: 0,
            candidates_skipped: 0,
        };
    }
    on_progress(0, total);

    let started = Instant::now();
    let num_batches = SEARCH_PROGRESS_BATCH_COUNT.min(total);
    let ranges = crate::parallel::batch_ranges(total, num_batches);

    let mut best: Option<BestFee> = None;
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for (start, end) in ranges {
        let batch: Vec<Option<CandidateResult>> = candidates[start..end]
            .par_iter()
            .map(|schedule| {
                if deadline_expired(config, started) {
                    return None;
                }
                Some(evaluate_candidate(model, listings, schedule))
            })
            .collect();

        // Sequential fold in enumeration order keeps the tie-break
        // deterministic.
        for result in batch {
            let Some(candidate) = result else {
                skipped += 1;
                continue;
            };
            evaluated += 1;
            let Some(host_gain_pct) = candidate.host_gain_pct else {
                continue;
            };
            if host_gain_pct < MIN_HOST_GAIN_PCT {
                continue;
            }
            let beats_best = best
                .as_ref()
                .map_or(true, |b| candidate.platform_revenue > b.platform_revenue);
            if beats_best {
                best = Some(BestFee {
                    schedule: candidate.schedule,
                    platform_revenue: candidate.platform_revenue,
                    host_revenue: candidate.host_revenue,
                    host_gain_pct,
                });
            }
        }
        on_progress(end, total);
    }

    if skipped > 0 {
        log::warn!("fee search deadline expired: {skipped}/{total} candidates skipped");
    }
    if best.is_none() {
        log::warn!("fee search found no schedule meeting the host-revenue floor");
    }

    SearchOutcome {
        best,
        candidates_total: total,
        candidates_evaluated: evaluated,
        candidates_skipped: skipped,
    }
}

fn deadline_expired(config: &SearchConfig, started: Instant) -> bool {
    config
        .deadline
        .is_some_and(|deadline| started.elapsed() >= deadline)
}

fn evaluate_candidate(
    model: &DemandModel,
    listings: &[Listing],
    schedule: &FeeSchedule,
) -> CandidateResult {
    let outcome = simulate(model, listings, schedule);
    let totals = market_totals(&outcome.rows);

    let host_gain_pct = if totals.original_host == 0.0 {
        None
    } else {
        Some((totals.simulated_host - totals.original_host) / totals.original_host * 100.0)
    };

    CandidateResult {
        schedule: *schedule,
        platform_revenue: totals.simulated_platform,
        host_revenue: totals.simulated_host,
        host_gain_pct,
    }
}
