//! Batch distribution for the parallel fee sweep.
//!
//! The grid search evaluates one candidate schedule per parallel task; this
//! module provides batch boundaries for progress reporting and a convenience
//! that pins the sweep to a configured worker pool.

use crate::data::Listing;
use crate::model::DemandModel;
use crate::parallel::pool::WorkerPool;
use crate::search::{grid_search_optimal_fee, SearchConfig, SearchOutcome};

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; earlier batches absorb the
/// remainder.
///
/// # Example
/// ```
/// # use feesim::parallel::batch_ranges;
/// let ranges = batch_ranges(10, 3);
/// assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + usize::from(i < remainder);
        ranges.push((start, start + size));
        start += size;
    }
    ranges
}

/// Run the grid search on a fixed-size worker pool instead of the global one.
pub fn run_search_batches(
    model: &DemandModel,
    listings: &[Listing],
    config: &SearchConfig,
    pool: &WorkerPool,
) -> SearchOutcome {
    pool.install(|| grid_search_optimal_fee(model, listings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_even_split() {
        let r = batch_ranges(100, 4);
        assert_eq!(r, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    }

    #[test]
    fn batch_ranges_with_remainder() {
        let r = batch_ranges(10, 3);
        assert_eq!(r, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_more_batches_than_items() {
        let r = batch_ranges(3, 10);
        assert_eq!(r, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn batch_ranges_empty() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }
}
