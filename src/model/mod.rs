pub mod artifact;
pub mod bundle;
pub mod regressor;
pub mod scaler;

pub use artifact::{ArtifactError, ArtifactStore, DEFAULT_MODEL_PATH};
pub use bundle::{
    DemandModel, EnsembleMembers, ModelBundle, PredictedListing, ENSEMBLE_WEIGHTS,
    ENSEMBLE_WEIGHT_TOTAL,
};
pub use regressor::{DecisionTree, Regressor, TreeNode};
pub use scaler::ScalerParams;
