//! Listing dataset: one record per listing, loaded from an assembled CSV.
//! The loader checks the header for every required column before touching any
//! row, so a renamed or dropped column fails with the column's name instead of
//! a row-level deserialization error.

use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATASET_PATH: &str = "assets/listings.csv";

/// Columns the pipeline reads. Extra columns in the file are ignored.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "price",
    "booked",
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
];

/// One listing row. `booked` is days booked over the annual horizon (0..=365);
/// rate columns are fractions, flag columns are 0/1 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub price: f64,
    pub booked: f64,
    pub host_response_rate: f64,
    pub host_acceptance_rate: f64,
    pub host_is_superhost: f64,
    pub instant_bookable: f64,
    pub number_of_reviews: f64,
    pub number_of_reviews_ltm: f64,
    pub reviews_per_month: f64,
    pub accommodates: f64,
    pub bedrooms: f64,
    pub review_scores_cleanliness: f64,
    pub review_scores_communication: f64,
    pub review_scores_checkin: f64,
    pub review_scores_value: f64,
    pub has_basic_score: f64,
    pub has_safety_score: f64,
    pub has_hygiene_score: f64,
    pub has_cooking_score: f64,
    pub has_sleep_score: f64,
    pub has_appliances_score: f64,
    pub has_work_score: f64,
    pub has_checkin_score: f64,
    pub has_pet_score: f64,
    pub has_longterm_score: f64,
}

#[derive(Debug)]
pub enum SchemaError {
    Read { path: String, source: std::io::Error },
    Header { path: String, source: csv::Error },
    MissingColumn { path: String, column: &'static str },
    Row { path: String, record: u64, source: csv::Error },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "failed to read dataset '{path}': {source}"),
            Self::Header { path, source } => {
                write!(f, "failed to read dataset header '{path}': {source}")
            }
            Self::MissingColumn { path, column } => {
                write!(f, "dataset '{path}' is missing required column '{column}'")
            }
            Self::Row {
                path,
                record,
                source,
            } => write!(f, "dataset '{path}' record {record}: {source}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Header { source, .. } | Self::Row { source, .. } => Some(source),
            Self::MissingColumn { .. } => None,
        }
    }
}

/// Load every listing from a CSV file. Fails fast on the first missing
/// required column or malformed record; nothing is fabricated for absent data.
pub fn load_listings(path: impl AsRef<Path>) -> Result<Vec<Listing>, SchemaError> {
    let path_label = path.as_ref().display().to_string();

    let file = File::open(path.as_ref()).map_err(|source| SchemaError::Read {
        path: path_label.clone(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| SchemaError::Header {
            path: path_label.clone(),
            source,
        })?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(SchemaError::MissingColumn {
                path: path_label,
                column,
            });
        }
    }

    let mut listings = Vec::new();
    for (index, record) in reader.deserialize::<Listing>().enumerate() {
        let listing = record.map_err(|source| SchemaError::Row {
            path: path_label.clone(),
            // +2: one for the header line, one for 1-based numbering.
            record: index as u64 + 2,
            source,
        })?;
        listings.push(listing);
    }
    Ok(listings)
}
