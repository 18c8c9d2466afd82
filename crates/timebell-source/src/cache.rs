//! Short-lived memo of the full timetable shared across requests.
//!
//! The memo is refreshed lazily by the first request after expiry. The slot
//! lock is held across the refresh so concurrent requests share one fetch.

use std::sync::Arc;
use std::time::Duration;

use timebell_core::ScheduleTable;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{ScheduleSource, SourceError};

struct Memo {
    table: Arc<ScheduleTable>,
    fetched_at: Instant,
}

pub struct TableCache {
    ttl: Duration,
    slot: Mutex<Option<Memo>>,
}

impl TableCache {
    /// A zero `ttl` disables memoisation.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_or_fetch(
        &self,
        source: &dyn ScheduleSource,
    ) -> Result<Arc<ScheduleTable>, SourceError> {
        if self.ttl.is_zero() {
            return source.fetch_full_timetable().await.map(Arc::new);
        }

        let mut slot = self.slot.lock().await;
        if let Some(memo) = slot.as_ref() {
            if memo.fetched_at.elapsed() < self.ttl {
                debug!("serving memoised timetable");
                return Ok(memo.table.clone());
            }
        }

        let table = Arc::new(source.fetch_full_timetable().await?);
        info!(
            grades = table.grade_count(),
            ttl_secs = self.ttl.as_secs(),
            "refreshed memoised timetable"
        );
        *slot = Some(Memo {
            table: table.clone(),
            fetched_at: Instant::now(),
        });
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{School, SourceOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use timebell_core::PeriodEntry;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ScheduleSource for CountingSource {
        async fn initialize(&self, _: &SourceOptions) -> Result<(), SourceError> {
            Ok(())
        }

        async fn search(&self, _: &str) -> Result<Vec<School>, SourceError> {
            Ok(Vec::new())
        }

        async fn select_school(&self, _: &str) -> Result<(), SourceError> {
            Ok(())
        }

        async fn fetch_full_timetable(&self) -> Result<ScheduleTable, SourceError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) as u32;
            if self.fail {
                return Err(SourceError::Server {
                    status: 502,
                    body: "upstream down".into(),
                });
            }
            let mut table = ScheduleTable::new();
            table.insert(1, 1, 0, vec![PeriodEntry::new(1, format!("fetch {n}"))]);
            Ok(table)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn memoises_within_ttl() {
        let source = CountingSource::default();
        let cache = TableCache::new(Duration::from_secs(600));

        let first = cache.get_or_fetch(&source).await.unwrap();
        tokio::time::advance(Duration::from_secs(599)).await;
        let second = cache.get_or_fetch(&source).await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_after_expiry() {
        let source = CountingSource::default();
        let cache = TableCache::new(Duration::from_secs(600));

        cache.get_or_fetch(&source).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        let table = cache.get_or_fetch(&source).await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(table.lookup(1, 1, 0)[0].subject, "fetch 1");
    }

    #[tokio::test]
    async fn zero_ttl_always_fetches() {
        let source = CountingSource::default();
        let cache = TableCache::new(Duration::ZERO);
        cache.get_or_fetch(&source).await.unwrap();
        cache.get_or_fetch(&source).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_memoised() {
        let source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let cache = TableCache::new(Duration::from_secs(600));
        assert!(cache.get_or_fetch(&source).await.is_err());
        assert!(cache.get_or_fetch(&source).await.is_err());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
