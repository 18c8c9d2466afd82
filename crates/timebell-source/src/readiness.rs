//! Readiness gate and background initializer.
//!
//! One task owns the `watch` sender and is the only writer of the readiness
//! state. It retries the preparation chain with a fixed delay until it
//! succeeds, publishes `Ready` once, and exits. Attempts run sequentially
//! inside that task, so they never overlap. Request handlers read the state
//! through a [`ReadinessGate`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{School, ScheduleSource, SourceOptions, prepare};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready { school: School },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Read-only view of the readiness state.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<Readiness>,
}

impl ReadinessGate {
    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_ready()
    }

    /// The selected school, once ready.
    pub fn school(&self) -> Option<School> {
        match &*self.rx.borrow() {
            Readiness::Ready { school } => Some(school.clone()),
            Readiness::NotReady => None,
        }
    }

    /// A gate stuck in the given state, with no initializer behind it.
    pub fn fixed(state: Readiness) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self { rx }
    }
}

#[derive(Debug, Clone)]
pub struct InitializerConfig {
    pub school_name: String,
    pub retry_delay: Duration,
    pub options: SourceOptions,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            school_name: "불곡고".to_string(),
            retry_delay: Duration::from_secs(60),
            options: SourceOptions::default(),
        }
    }
}

/// Spawn the initializer task and return the gate it drives.
pub fn spawn_initializer(
    source: Arc<dyn ScheduleSource>,
    config: InitializerConfig,
) -> (ReadinessGate, JoinHandle<()>) {
    let (tx, rx) = watch::channel(Readiness::NotReady);
    let handle = tokio::spawn(run_initializer(source, config, tx));
    (ReadinessGate { rx }, handle)
}

async fn run_initializer(
    source: Arc<dyn ScheduleSource>,
    config: InitializerConfig,
    tx: watch::Sender<Readiness>,
) {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        info!(attempt, school = %config.school_name, "initializing schedule source");
        match prepare(source.as_ref(), &config.school_name, &config.options).await {
            Ok(school) => {
                info!(attempt, school = %school.name, code = %school.code, "schedule source ready");
                tx.send_replace(Readiness::Ready { school });
                return;
            }
            Err(err) => {
                error!(
                    attempt,
                    error = %err,
                    retry_in_secs = config.retry_delay.as_secs(),
                    "schedule source initialization failed"
                );
                tokio::time::sleep(config.retry_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use timebell_core::ScheduleTable;

    /// Fails the first `failures` searches, then finds one school.
    struct FlakySource {
        failures: usize,
        searches: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FlakySource {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                searches: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScheduleSource for FlakySource {
        async fn initialize(&self, _: &SourceOptions) -> Result<(), SourceError> {
            Ok(())
        }

        async fn search(&self, _: &str) -> Result<Vec<School>, SourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            // Slow enough that a retry timer would fire mid-attempt if attempts overlapped.
            tokio::time::sleep(Duration::from_secs(90)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let n = self.searches.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(SourceError::Server {
                    status: 503,
                    body: "upstream unavailable".into(),
                });
            }
            Ok(vec![School::new("불곡고", "300")])
        }

        async fn select_school(&self, _: &str) -> Result<(), SourceError> {
            Ok(())
        }

        async fn fetch_full_timetable(&self) -> Result<ScheduleTable, SourceError> {
            Ok(ScheduleTable::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_ready() {
        let source = Arc::new(FlakySource::new(3));
        let (gate, handle) = spawn_initializer(source.clone(), InitializerConfig::default());
        assert!(!gate.is_ready());

        // The task exits only after publishing `Ready`.
        handle.await.unwrap();
        assert!(gate.is_ready());
        assert_eq!(gate.school(), Some(School::new("불곡고", "300")));
        assert_eq!(source.searches.load(Ordering::SeqCst), 4);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_not_ready_between_attempts() {
        let source = Arc::new(FlakySource::new(usize::MAX));
        let (gate, handle) = spawn_initializer(source.clone(), InitializerConfig::default());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(!gate.is_ready());
        assert_eq!(gate.school(), None);
        assert!(source.searches.load(Ordering::SeqCst) >= 3);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_search_is_retried() {
        struct NoSchools;

        #[async_trait]
        impl ScheduleSource for NoSchools {
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
                Ok(ScheduleTable::new())
            }
        }

        let (gate, handle) = spawn_initializer(Arc::new(NoSchools), InitializerConfig::default());
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(!gate.is_ready());
        handle.abort();
    }

    #[test]
    fn fixed_ready_gate() {
        let gate = ReadinessGate::fixed(Readiness::Ready {
            school: School::new("불곡고", "300"),
        });
        assert!(gate.is_ready());
        assert!(!ReadinessGate::fixed(Readiness::NotReady).is_ready());
    }
}
