pub mod listing;
pub mod validate;

pub use listing::{load_listings, Listing, SchemaError, DEFAULT_DATASET_PATH, REQUIRED_COLUMNS};
pub use validate::{
    validate_listing_dataset, ValidationDiagnostic, ValidationReport, ValidationSeverity,
};
