//! Revenue simulation for tiered marketplace fee schedules.
//!
//! Listings are bucketed into three booking-volume tiers, a proposed fee rate
//! is assigned per tier, an externally trained demand model predicts how many
//! days each listing books under the new fees, and the revenue aggregator
//! compares platform/host revenue before and after. The grid search sweeps
//! the fee space for the schedule that maximizes platform revenue without
//! shrinking host revenue.

pub mod cli;
pub mod data;
pub mod model;
pub mod parallel;
pub mod search;
pub mod server;
pub mod sim;
