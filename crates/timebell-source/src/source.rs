use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use timebell_core::ScheduleTable;
use tracing::info;

use crate::SourceError;

/// A school as returned by a source search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
}

impl School {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// School codes show up as either numbers or strings.
fn code_as_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "school code must be a string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    /// How long the source may reuse upstream data it already holds.
    pub cache_ttl: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// An upstream supplier of school timetables.
///
/// The lifecycle is `initialize` → `search` → `select_school`, after which
/// `fetch_full_timetable` may be called any number of times.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn initialize(&self, options: &SourceOptions) -> Result<(), SourceError>;

    async fn search(&self, school_name: &str) -> Result<Vec<School>, SourceError>;

    async fn select_school(&self, code: &str) -> Result<(), SourceError>;

    async fn fetch_full_timetable(&self) -> Result<ScheduleTable, SourceError>;
}

/// Pick the school for `name`: exact name first, then the first name
/// containing it, then the first result.
pub fn select_best_match<'a>(schools: &'a [School], name: &str) -> Option<&'a School> {
    let name = name.trim();
    schools
        .iter()
        .find(|s| s.name.trim() == name)
        .or_else(|| schools.iter().find(|s| s.name.contains(name)))
        .or_else(|| schools.first())
}

/// Run the full preparation chain against `source` and return the selected school.
pub async fn prepare(
    source: &dyn ScheduleSource,
    school_name: &str,
    options: &SourceOptions,
) -> Result<School, SourceError> {
    source.initialize(options).await?;
    let schools = source.search(school_name).await?;
    info!(query = school_name, count = schools.len(), "school search complete");

    let school = select_best_match(&schools, school_name)
        .cloned()
        .ok_or_else(|| SourceError::SchoolNotFound(school_name.to_string()))?;
    source.select_school(&school.code).await?;
    Ok(school)
}
