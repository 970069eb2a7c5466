//! Model bundle and the demand-model prediction contract.
//!
//! An artifact is a JSON document holding a fitted scaler plus either one
//! `model` or an ensemble `members` block; which field is present selects the
//! adapter variant. Both variants run the same feature-derivation path and
//! expose the same contract: tiered listings in, predicted booking days out.

use serde::Deserialize;

use crate::model::artifact::ArtifactError;
use crate::model::regressor::Regressor;
use crate::model::scaler::ScalerParams;
use crate::sim::features::{feature_matrix, population_mean_reviews, FEATURE_COLUMNS};
use crate::sim::tiering::TieredListing;

/// Blend weights over the ensemble members (rf, lgb, gb, knn), normalized by
/// their sum. A fixed design constant, not configurable.
pub const ENSEMBLE_WEIGHTS: [f64; 4] = [4.0, 2.0, 2.0, 2.0];
pub const ENSEMBLE_WEIGHT_TOTAL: f64 = 10.0;

/// On-disk artifact shape. Exactly one of `model` / `members` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelBundle {
    #[serde(default)]
    pub schema_version: u32,
    /// Feature order the artifact was trained against, when recorded. Used to
    /// detect a scaler/regressor generation that does not match this crate.
    #[serde(default)]
    pub feature_columns: Option<Vec<String>>,
    pub scaler: ScalerParams,
    #[serde(default)]
    pub model: Option<Regressor>,
    #[serde(default)]
    pub members: Option<EnsembleMembers>,
}

/// The four ensemble members, keyed by their training-stack names.
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleMembers {
    pub rf: Regressor,
    pub lgb: Regressor,
    pub gb: Regressor,
    pub knn: Regressor,
}

/// A listing with its predicted booking days under the applied fee schedule.
/// `booked_new` is continuous and deliberately neither rounded nor clamped to
/// the horizon; surfaces needing whole days truncate explicitly.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PredictedListing {
    pub row: TieredListing,
    pub booked_new: f64,
}

/// The demand model behind one predict contract: a single estimator or the
/// weighted four-member ensemble, each paired with its fitted scaler.
#[derive(Debug, Clone)]
pub enum DemandModel {
    Single {
        scaler: ScalerParams,
        model: Regressor,
    },
    Ensemble {
        scaler: ScalerParams,
        members: EnsembleMembers,
    },
}

impl DemandModel {
    /// Validate a loaded bundle and select the variant by which field is
    /// present. Every structural problem is an artifact error raised before
    /// any prediction happens.
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, ArtifactError> {
        let width = FEATURE_COLUMNS.len();

        if let Some(columns) = &bundle.feature_columns {
            if columns.len() != width
                || columns.iter().zip(FEATURE_COLUMNS).any(|(a, b)| a != b)
            {
                return Err(ArtifactError::Mismatch {
                    context: "feature_columns do not match this crate's feature order".to_string(),
                });
            }
        }
        bundle
            .scaler
            .check(width)
            .map_err(|context| ArtifactError::Mismatch { context })?;

        match (bundle.model, bundle.members) {
            (Some(model), None) => {
                model
                    .check(width, "model")
                    .map_err(|context| ArtifactError::Mismatch { context })?;
                Ok(Self::Single {
                    scaler: bundle.scaler,
                    model,
                })
            }
            (None, Some(members)) => {
                for (name, member) in [
                    ("members.rf", &members.rf),
                    ("members.lgb", &members.lgb),
                    ("members.gb", &members.gb),
                    ("members.knn", &members.knn),
                ] {
                    member
                        .check(width, name)
                        .map_err(|context| ArtifactError::Mismatch { context })?;
                }
                Ok(Self::Ensemble {
                    scaler: bundle.scaler,
                    members,
                })
            }
            (Some(_), Some(_)) => Err(ArtifactError::Mismatch {
                context: "bundle carries both 'model' and 'members'".to_string(),
            }),
            (None, None) => Err(ArtifactError::Mismatch {
                context: "bundle carries neither 'model' nor 'members'".to_string(),
            }),
        }
    }

    pub fn variant(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Ensemble { .. } => "ensemble",
        }
    }

    /// Predict booking days for every tiered listing. The batch mean of
    /// `number_of_reviews` is recomputed from this exact batch before feature
    /// derivation, then the paired scaler is applied and the estimator(s) run.
    pub fn predict_booked_days(&self, rows: &[TieredListing]) -> Vec<PredictedListing> {
        let mean_reviews = population_mean_reviews(rows);
        let matrix = feature_matrix(rows, mean_reviews);

        let predictions = match self {
            Self::Single { scaler, model } => model.predict(&scaler.transform(&matrix)),
            Self::Ensemble { scaler, members } => {
                let scaled = scaler.transform(&matrix);
                blend_members(members, &scaled)
            }
        };

        rows.iter()
            .zip(predictions)
            .map(|(row, booked_new)| PredictedListing {
                row: row.clone(),
                booked_new,
            })
            .collect()
    }
}

/// Weighted average of the four member predictions.
fn blend_members(members: &EnsembleMembers, scaled: &[Vec<f64>]) -> Vec<f64> {
    let member_predictions = [
        members.rf.predict(scaled),
        members.lgb.predict(scaled),
        members.gb.predict(scaled),
        members.knn.predict(scaled),
    ];

    (0..scaled.len())
        .map(|row| {
            member_predictions
                .iter()
                .zip(ENSEMBLE_WEIGHTS)
                .map(|(predictions, weight)| predictions[row] * weight)
                .sum::<f64>()
                / ENSEMBLE_WEIGHT_TOTAL
        })
        .collect()
}
