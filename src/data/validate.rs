//! Dataset validation: schema and per-row invariant checks with severities,
//! reported instead of thrown so one bad row does not hide the rest.

use std::fmt;
use std::path::Path;

use crate::data::listing::{load_listings, SchemaError, REQUIRED_COLUMNS};
use crate::sim::tiering::BOOKING_HORIZON_DAYS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Validate a listing dataset file. Schema problems (unreadable file, missing
/// column, malformed record) become error diagnostics; rows that load are
/// checked against the documented invariants: `booked` in [0, 365], `price`
/// non-negative, rate columns inside [0, 1].
pub fn validate_listing_dataset(path: impl AsRef<Path>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let path_label = path.as_ref().display().to_string();

    let listings = match load_listings(path.as_ref()) {
        Ok(listings) => listings,
        Err(SchemaError::MissingColumn { column, .. }) => {
            report.push(
                ValidationSeverity::Error,
                format!("header.{column}"),
                "required column is absent",
            );
            // Name every other absent column too, not just the first.
            report_remaining_missing_columns(path.as_ref(), column, &mut report);
            return report;
        }
        Err(err) => {
            report.push(ValidationSeverity::Error, path_label, err.to_string());
            return report;
        }
    };

    if listings.is_empty() {
        report.push(
            ValidationSeverity::Warning,
            path_label,
            "dataset contains no rows",
        );
        return report;
    }

    for (index, listing) in listings.iter().enumerate() {
        let row = format!("row[{index}] id={}", listing.id);

        if listing.booked < 0.0 || listing.booked > BOOKING_HORIZON_DAYS {
            report.push(
                ValidationSeverity::Error,
                format!("{row}.booked"),
                format!("{} outside [0, 365]", listing.booked),
            );
        }
        if listing.price < 0.0 {
            report.push(
                ValidationSeverity::Error,
                format!("{row}.price"),
                format!("negative price {}", listing.price),
            );
        }
        for (column, value) in [
            ("host_response_rate", listing.host_response_rate),
            ("host_acceptance_rate", listing.host_acceptance_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{row}.{column}"),
                    format!("{value} outside [0, 1]"),
                );
            }
        }
        if listing.reviews_per_month < 0.0 {
            report.push(
                ValidationSeverity::Warning,
                format!("{row}.reviews_per_month"),
                format!("negative value {}", listing.reviews_per_month),
            );
        }
    }

    report
}

/// After the loader stopped on the first absent column, re-read the header to
/// report any further ones in the same pass.
fn report_remaining_missing_columns(
    path: &Path,
    already_reported: &str,
    report: &mut ValidationReport,
) {
    let Ok(mut reader) = csv::Reader::from_path(path) else {
        return;
    };
    let Ok(headers) = reader.headers() else {
        return;
    };
    for column in REQUIRED_COLUMNS {
        if *column != already_reported && !headers.iter().any(|h| h == *column) {
            report.push(
                ValidationSeverity::Error,
                format!("header.{column}"),
                "required column is absent",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::listing::REQUIRED_COLUMNS;
    use std::fs;
    use std::path::PathBuf;

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("feesim_validate_{name}_{}.csv", std::process::id()));
        fs::write(&path, contents).expect("write temp csv");
        path
    }

    fn row(id: u64, booked: f64, price: f64) -> String {
        format!("{id},{price},{booked},0.9,0.8,1,1,30,10,1.2,4,2,4.5,4.8,4.7,4.6,1,1,1,0,1,1,0,1,0,1")
    }

    #[test]
    fn clean_dataset_has_no_errors() {
        let contents = format!("{}\n{}\n", REQUIRED_COLUMNS.join(","), row(1, 100.0, 90.0));
        let path = temp_csv("clean", &contents);

        let report = validate_listing_dataset(&path);
        assert!(!report.has_errors(), "{:?}", report.diagnostics);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn booked_out_of_horizon_is_an_error() {
        let contents = format!("{}\n{}\n", REQUIRED_COLUMNS.join(","), row(1, 400.0, 90.0));
        let path = temp_csv("booked", &contents);

        let report = validate_listing_dataset(&path);
        assert!(report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.context.contains(".booked")));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn every_missing_column_is_named() {
        let header = REQUIRED_COLUMNS
            .iter()
            .filter(|c| **c != "price" && **c != "bedrooms")
            .copied()
            .collect::<Vec<_>>()
            .join(",");
        let path = temp_csv("missing_two", &format!("{header}\n"));

        let report = validate_listing_dataset(&path);
        assert!(report.has_errors());
        assert!(report.diagnostics.iter().any(|d| d.context == "header.price"));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.context == "header.bedrooms"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_dataset_warns() {
        let path = temp_csv("empty", &format!("{}\n", REQUIRED_COLUMNS.join(",")));

        let report = validate_listing_dataset(&path);
        assert!(!report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.severity == ValidationSeverity::Warning));

        let _ = fs::remove_file(path);
    }
}
