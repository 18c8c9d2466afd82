//! File-backed source reading a JSON snapshot of school timetables.
//!
//! ```json
//! {
//!   "schools": [ { "name": "불곡고등학교", "code": "12045" } ],
//!   "timetables": { "12045": { "2": { "5": [ [ { "classTime": 1, "subject": "국어" } ] ] } } }
//! }
//! ```
//!
//! The file is re-read when the loaded copy is older than the cache TTL given
//! to `initialize`, so an external job can refresh it in place.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use timebell_core::ScheduleTable;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

use crate::{School, ScheduleSource, SourceError, SourceOptions};

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    schools: Vec<School>,
    #[serde(default)]
    timetables: HashMap<String, Value>,
}

struct Loaded {
    snapshot: Snapshot,
    at: Instant,
}

#[derive(Default)]
struct State {
    ttl: Duration,
    loaded: Option<Loaded>,
    selected: Option<String>,
}

pub struct SnapshotSource {
    path: PathBuf,
    state: RwLock<State>,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(State::default()),
        }
    }

    async fn read_snapshot(&self) -> Result<Snapshot, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        info!(
            path = %self.path.display(),
            schools = snapshot.schools.len(),
            timetables = snapshot.timetables.len(),
            "loaded timetable snapshot"
        );
        Ok(snapshot)
    }

    /// Reload the snapshot if it is missing or older than the TTL.
    async fn refresh(&self) -> Result<(), SourceError> {
        {
            let state = self.state.read().await;
            if let Some(loaded) = &state.loaded {
                if loaded.at.elapsed() < state.ttl {
                    return Ok(());
                }
            }
        }
        let snapshot = self.read_snapshot().await?;
        self.state.write().await.loaded = Some(Loaded {
            snapshot,
            at: Instant::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl ScheduleSource for SnapshotSource {
    async fn initialize(&self, options: &SourceOptions) -> Result<(), SourceError> {
        let snapshot = self.read_snapshot().await?;
        let mut state = self.state.write().await;
        state.ttl = options.cache_ttl;
        state.loaded = Some(Loaded {
            snapshot,
            at: Instant::now(),
        });
        Ok(())
    }

    async fn search(&self, school_name: &str) -> Result<Vec<School>, SourceError> {
        let state = self.state.read().await;
        let loaded = state.loaded.as_ref().ok_or(SourceError::NotInitialized)?;
        let needle = school_name.trim();
        Ok(loaded
            .snapshot
            .schools
            .iter()
            .filter(|s| s.name.contains(needle))
            .cloned()
            .collect())
    }

    async fn select_school(&self, code: &str) -> Result<(), SourceError> {
        let mut state = self.state.write().await;
        let loaded = state.loaded.as_ref().ok_or(SourceError::NotInitialized)?;
        if !loaded.snapshot.schools.iter().any(|s| s.code == code) {
            return Err(SourceError::SchoolNotFound(code.to_string()));
        }
        state.selected = Some(code.to_string());
        Ok(())
    }

    async fn fetch_full_timetable(&self) -> Result<ScheduleTable, SourceError> {
        self.refresh().await?;
        let state = self.state.read().await;
        let code = state.selected.as_deref().ok_or(SourceError::NoSchoolSelected)?;
        let loaded = state.loaded.as_ref().ok_or(SourceError::NotInitialized)?;
        Ok(loaded
            .snapshot
            .timetables
            .get(code)
            .map(ScheduleTable::from_raw)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare;
    use std::io::Write;
    use timebell_core::PeriodEntry;

    const SNAPSHOT: &str = r#"{
        "schools": [
            { "name": "불곡중학교", "code": 100 },
            { "name": "불곡고등학교", "code": "200" }
        ],
        "timetables": {
            "200": { "2": { "5": [ [], [ { "classTime": 1, "subject": "국어" } ] ] } }
        }
    }"#;

    fn snapshot_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn prepare_and_fetch() {
        let file = snapshot_file(SNAPSHOT);
        let source = SnapshotSource::new(file.path());
        let school = prepare(&source, "불곡고", &SourceOptions::default())
            .await
            .unwrap();
        assert_eq!(school, School::new("불곡고등학교", "200"));

        let table = source.fetch_full_timetable().await.unwrap();
        assert_eq!(table.lookup(2, 5, 1), &[PeriodEntry::new(1, "국어")]);
        assert!(table.lookup(2, 5, 0).is_empty());
    }

    #[tokio::test]
    async fn search_before_initialize_fails() {
        let file = snapshot_file(SNAPSHOT);
        let source = SnapshotSource::new(file.path());
        assert!(matches!(
            source.search("불곡").await,
            Err(SourceError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn fetch_without_selection_fails() {
        let file = snapshot_file(SNAPSHOT);
        let source = SnapshotSource::new(file.path());
        source.initialize(&SourceOptions::default()).await.unwrap();
        assert!(matches!(
            source.fetch_full_timetable().await,
            Err(SourceError::NoSchoolSelected)
        ));
    }

    #[tokio::test]
    async fn unknown_school_not_selectable() {
        let file = snapshot_file(SNAPSHOT);
        let source = SnapshotSource::new(file.path());
        source.initialize(&SourceOptions::default()).await.unwrap();
        assert!(matches!(
            source.select_school("999").await,
            Err(SourceError::SchoolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let source = SnapshotSource::new("/nonexistent/timebell/snapshot.json");
        assert!(matches!(
            source.initialize(&SourceOptions::default()).await,
            Err(SourceError::Io(_))
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_json_error() {
        let file = snapshot_file("{ not json");
        let source = SnapshotSource::new(file.path());
        assert!(matches!(
            source.initialize(&SourceOptions::default()).await,
            Err(SourceError::Json(_))
        ));
    }

    #[tokio::test]
    async fn reloads_after_ttl() {
        let file = snapshot_file(SNAPSHOT);
        let source = SnapshotSource::new(file.path());
        let options = SourceOptions {
            cache_ttl: Duration::ZERO,
        };
        prepare(&source, "불곡고등학교", &options).await.unwrap();

        let updated = SNAPSHOT.replace("국어", "수학");
        std::fs::write(file.path(), updated).unwrap();

        let table = source.fetch_full_timetable().await.unwrap();
        assert_eq!(table.lookup(2, 5, 1), &[PeriodEntry::new(1, "수학")]);
    }
}
