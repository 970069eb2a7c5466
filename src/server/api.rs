//! JSON payload handlers behind the router. Fee rates cross this boundary as
//! percentages (the unit the consumer UI speaks) and are converted to
//! fractions exactly once, on the way in.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::{load_listings, Listing, DEFAULT_DATASET_PATH};
use crate::model::{ArtifactStore, DemandModel};
use crate::search::{grid_search_optimal_fee, SearchConfig};
use crate::sim::revenue::sales_by_tier;
use crate::sim::tiering::{FeeSchedule, Tier};
use crate::sim::{scenario_quote, simulate};

/// Scenario surface defaults when the request names no schedule.
const SCENARIO_DEFAULT_FEES: FeePercents = FeePercents {
    high: 2.4,
    mid: 3.3,
    low: 5.5,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeePercents {
    pub high: f64,
    pub mid: f64,
    pub low: f64,
}

impl FeePercents {
    fn to_schedule(self) -> FeeSchedule {
        FeeSchedule::from_percentages(self.high, self.mid, self.low)
    }

    fn from_schedule(schedule: &FeeSchedule) -> Self {
        let (high, mid, low) = schedule.as_percentages();
        Self { high, mid, low }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationErrorResponse {
    fn new(errors: Vec<ValidationIssue>) -> Self {
        Self {
            status: "error",
            message: "Validation failed",
            errors,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Parse(serde_json::Error),
    Validation(ValidationErrorResponse),
    /// Dataset or model failed to load; carries the underlying error text.
    Dependency(String),
    Serialize(serde_json::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Validation(_) => write!(f, "invalid request"),
            Self::Dependency(message) => write!(f, "{message}"),
            Self::Serialize(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ApiError {}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "feesim-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateRequest {
    pub fees: FeePercents,
    pub dataset: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierSummary {
    pub tier: Tier,
    pub listings: usize,
    pub sales: f64,
    pub fee_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub status: &'static str,
    pub schedule: FeePercents,
    pub original_total: f64,
    pub simulated_total: f64,
    pub revenue_change_pct: Option<f64>,
    pub tiers: Vec<TierSummary>,
}

pub fn simulate_payload(body: &str) -> Result<String, ApiError> {
    let request: SimulateRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    validate_fees(&request.fees)?;

    let listings = load_dataset(request.dataset.as_deref())?;
    let model = load_model(request.model.as_deref())?;
    let schedule = request.fees.to_schedule();

    let outcome = simulate(&model, &listings, &schedule);
    let tiers = sales_by_tier(&outcome.rows, &outcome.report.sales)
        .into_iter()
        .map(|breakdown| TierSummary {
            tier: breakdown.tier,
            listings: breakdown.listings,
            sales: breakdown.sales,
            fee_pct: schedule.rate_for(breakdown.tier).max(0.0) * 100.0,
        })
        .collect();

    let response = SimulateResponse {
        status: "ok",
        schedule: request.fees,
        original_total: outcome.report.original_total,
        simulated_total: outcome.report.simulated_total,
        revenue_change_pct: outcome.report.revenue_change_pct,
        tiers,
    };
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub step_pct: Option<f64>,
    pub max_pct: Option<f64>,
    pub deadline_secs: Option<u64>,
    pub dataset: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestFeePayload {
    pub schedule: FeePercents,
    pub platform_revenue: f64,
    pub host_revenue: f64,
    pub host_gain_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub status: &'static str,
    pub best: Option<BestFeePayload>,
    pub candidates_total: usize,
    pub candidates_evaluated: usize,
    pub candidates_skipped: usize,
}

pub fn optimize_payload(body: &str) -> Result<String, ApiError> {
    let request: OptimizeRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;

    let step_pct = request.step_pct.unwrap_or(0.5);
    let max_pct = request.max_pct.unwrap_or(6.0);
    let mut errors = Vec::new();
    if step_pct <= 0.0 || !step_pct.is_finite() {
        errors.push(ValidationIssue {
            field: "step_pct",
            messages: vec![format!("must be positive, got {step_pct}")],
        });
    }
    if max_pct < step_pct || max_pct > 100.0 {
        errors.push(ValidationIssue {
            field: "max_pct",
            messages: vec![format!("must be in [step_pct, 100], got {max_pct}")],
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(ValidationErrorResponse::new(errors)));
    }

    let listings = load_dataset(request.dataset.as_deref())?;
    let model = load_model(request.model.as_deref())?;
    let config = SearchConfig {
        fee_step: step_pct / 100.0,
        fee_max: max_pct / 100.0,
        deadline: request.deadline_secs.map(Duration::from_secs),
    };

    let outcome = grid_search_optimal_fee(&model, &listings, &config);
    let response = OptimizeResponse {
        status: if outcome.best.is_some() {
            "ok"
        } else {
            "infeasible"
        },
        best: outcome.best.map(|best| BestFeePayload {
            schedule: FeePercents::from_schedule(&best.schedule),
            platform_revenue: best.platform_revenue,
            host_revenue: best.host_revenue,
            host_gain_pct: best.host_gain_pct,
        }),
        candidates_total: outcome.candidates_total,
        candidates_evaluated: outcome.candidates_evaluated,
        candidates_skipped: outcome.candidates_skipped,
    };
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRequest {
    pub listing_index: usize,
    pub fees: Option<FeePercents>,
    pub dataset: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResponse {
    pub status: &'static str,
    pub listing_id: u64,
    pub predicted_days: i64,
    pub tier: Tier,
    pub fee_pct: f64,
}

/// Host-facing quote: what fee this listing would pay next period, based on
/// its predicted demand under the given (or default) schedule.
pub fn scenario_payload(body: &str) -> Result<String, ApiError> {
    let request: ScenarioRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let fees = request.fees.unwrap_or(SCENARIO_DEFAULT_FEES);
    validate_fees(&fees)?;

    let listings = load_dataset(request.dataset.as_deref())?;
    if request.listing_index >= listings.len() {
        return Err(ApiError::Validation(ValidationErrorResponse::new(vec![
            ValidationIssue {
                field: "listing_index",
                messages: vec![format!(
                    "index {} beyond dataset of {} listings",
                    request.listing_index,
                    listings.len()
                )],
            },
        ])));
    }
    let model = load_model(request.model.as_deref())?;
    let schedule = fees.to_schedule();

    let outcome = simulate(&model, &listings, &schedule);
    let row = &outcome.rows[request.listing_index];
    let quote = scenario_quote(row, &schedule);

    let response = ScenarioResponse {
        status: "ok",
        listing_id: row.row.listing.id,
        predicted_days: quote.predicted_days,
        tier: quote.tier,
        fee_pct: quote.fee_rate * 100.0,
    };
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}

fn validate_fees(fees: &FeePercents) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("fees.high", fees.high),
        ("fees.mid", fees.mid),
        ("fees.low", fees.low),
    ] {
        if !(0.0..=100.0).contains(&value) || !value.is_finite() {
            errors.push(ValidationIssue {
                field,
                messages: vec![format!("fee percent must be in [0, 100], got {value}")],
            });
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(ValidationErrorResponse::new(errors)))
    }
}

fn load_dataset(path: Option<&str>) -> Result<Vec<Listing>, ApiError> {
    let path = path.map(str::to_string).unwrap_or_else(default_dataset_path);
    load_listings(&path).map_err(|err| ApiError::Dependency(err.to_string()))
}

fn default_dataset_path() -> String {
    std::env::var("FEESIM_DATASET").unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string())
}

fn load_model(path: Option<&str>) -> Result<DemandModel, ApiError> {
    let store = match path {
        Some(path) => ArtifactStore::new(path, None),
        None => ArtifactStore::from_env(),
    };
    store
        .load()
        .map_err(|err| ApiError::Dependency(err.to_string()))
}
