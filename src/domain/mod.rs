pub mod track;
pub mod album;
pub mod genre;
pub mod artwork;
pub mod playlist;
pub mod radio;
pub mod queue;
pub mod refs;

use serde::{Serialize, Deserialize};

use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filepath cannot be an empty string.")]
    FilepathIsEmptyString,

    #[error("Title field cannot be an empty string.")]
    TitleIsEmptyString,

    #[error("Name field cannot be an empty string.")]
    NameIsEmptyString,

    #[error("A compilation album cannot have a single Artist set.")]
    CompilationHasArtist,

    #[error("Duration cannot be zero.")]
    DurationIsZero,
}

#[derive(Debug)]
pub struct BatchSaveOutcome {
    pub batch_index: usize,
    pub result: Result<i64, RepositoryError>,
}

#[derive(Debug)]
pub struct BatchSaveReport {
    pub outcomes: Vec<BatchSaveOutcome>,
}

impl BatchSaveReport {
    pub fn new() -> Self {
        Self { outcomes: Vec::new() }
    }

    pub fn successful_ids(&self) -> Vec<i64> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().copied())
            .collect()
    }

    pub fn failed(&self) -> Vec<&BatchSaveOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .collect()
    }
}

#[derive(Debug)]
pub struct BatchDeleteReport {
    pub deleted_ids: Vec<i64>,
    pub failed: Vec<(i64, RepositoryError)>,
}

impl BatchDeleteReport {
    pub fn new() -> Self {
        Self { deleted_ids: Vec::new(), failed: Vec::new() }
    }
}

/// The four verbosity tiers a JSON response can be built at. Mirrors the
/// `?info=` query parameter accepted throughout the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InformationLevel {
    None,
    Links,
    All,
    Debug,
}

impl InformationLevel {
    pub fn from_str_or_default(value: &str, default: InformationLevel) -> Self {
        match value.to_lowercase().as_str() {
            "none" => InformationLevel::None,
            "links" => InformationLevel::Links,
            "all" => InformationLevel::All,
            "debug" => InformationLevel::Debug,
            _ => default,
        }
    }
}

impl Default for InformationLevel {
    fn default() -> Self {
        InformationLevel::Links
    }
}
