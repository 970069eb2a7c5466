//! Artifact store: resolve the model bundle from its local cache path,
//! fetching it from remote storage the first time.
//!
//! The store is constructed once and injected wherever a model is needed; it
//! is never a process-wide global. Cache key is the file path: if the file
//! exists the fetch is skipped entirely. No checksum is validated against the
//! cache (a known open risk); corruption surfaces at parse/validation time.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::bundle::{DemandModel, ModelBundle};

pub const DEFAULT_MODEL_PATH: &str = "models/demand_model.json";

const FETCH_ATTEMPTS: u32 = 3;
const FETCH_BACKOFF_BASE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum ArtifactError {
    /// No cache file and no remote URL configured.
    Missing { path: PathBuf },
    Fetch {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Scaler/regressor structure does not fit this crate's feature order.
    Mismatch { context: String },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(
                f,
                "model artifact '{}' is absent and no remote URL is configured",
                path.display()
            ),
            Self::Fetch {
                url,
                attempts,
                source,
            } => write!(
                f,
                "failed to fetch model artifact from '{url}' after {attempts} attempts: {source}"
            ),
            Self::Read { path, source } => write!(
                f,
                "failed to read model artifact '{}': {source}",
                path.display()
            ),
            Self::Write { path, source } => write!(
                f,
                "failed to persist model artifact '{}': {source}",
                path.display()
            ),
            Self::Parse { path, source } => write!(
                f,
                "failed to parse model artifact '{}': {source}",
                path.display()
            ),
            Self::Mismatch { context } => write!(f, "model artifact mismatch: {context}"),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Missing { .. } | Self::Mismatch { .. } => None,
        }
    }
}

/// Resolves and loads the demand-model bundle. Load once at startup and hold
/// the resulting [DemandModel] for the process lifetime.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
    remote_url: Option<String>,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>, remote_url: Option<String>) -> Self {
        Self {
            path: path.into(),
            remote_url,
        }
    }

    /// Store configured from `FEESIM_MODEL` / `FEESIM_MODEL_URL`, defaulting
    /// to the well-known local path.
    pub fn from_env() -> Self {
        let path = std::env::var("FEESIM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
        let remote_url = std::env::var("FEESIM_MODEL_URL").ok();
        Self::new(path, remote_url)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the artifact: fetch if the cache file is absent, then parse and
    /// validate. Every failure mode surfaces here, before any prediction.
    pub fn load(&self) -> Result<DemandModel, ArtifactError> {
        if !self.path.exists() {
            let Some(url) = self.remote_url.as_deref() else {
                return Err(ArtifactError::Missing {
                    path: self.path.clone(),
                });
            };
            self.fetch(url)?;
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| ArtifactError::Read {
            path: self.path.clone(),
            source,
        })?;
        let bundle: ModelBundle =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
                path: self.path.clone(),
                source,
            })?;
        let model = DemandModel::from_bundle(bundle)?;
        log::info!(
            "loaded {} demand model from {}",
            model.variant(),
            self.path.display()
        );
        Ok(model)
    }

    /// Bounded-retry download written through a temp file and renamed into
    /// place, so a partial download is never loadable as the cache.
    fn fetch(&self, url: &str) -> Result<(), ArtifactError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let mut last_error = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            log::info!("fetching model artifact from {url} (attempt {attempt}/{FETCH_ATTEMPTS})");
            match try_fetch(url) {
                Ok(bytes) => {
                    let staging = self.path.with_extension("download");
                    fs::write(&staging, &bytes).map_err(|source| ArtifactError::Write {
                        path: staging.clone(),
                        source,
                    })?;
                    fs::rename(&staging, &self.path).map_err(|source| ArtifactError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
                    return Ok(());
                }
                Err(err) => {
                    log::warn!("artifact fetch attempt {attempt} failed: {err}");
                    last_error = Some(err);
                    if attempt < FETCH_ATTEMPTS {
                        std::thread::sleep(FETCH_BACKOFF_BASE * 2u32.pow(attempt - 1));
                    }
                }
            }
        }

        Err(ArtifactError::Fetch {
            url: url.to_string(),
            attempts: FETCH_ATTEMPTS,
            source: last_error.expect("at least one attempt ran"),
        })
    }
}

fn try_fetch(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}
