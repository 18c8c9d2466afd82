//! Schedule source boundary: the async source trait, school selection, the
//! readiness gate driven by a background initializer, and the memoised
//! timetable cache.

mod cache;
mod error;
mod readiness;
mod snapshot;
mod source;

#[cfg(feature = "http")]
pub mod http;

pub use cache::TableCache;
pub use error::SourceError;
pub use readiness::{InitializerConfig, Readiness, ReadinessGate, spawn_initializer};
pub use snapshot::SnapshotSource;
pub use source::{School, ScheduleSource, SourceOptions, prepare, select_best_match};

#[cfg(feature = "http")]
pub use http::HttpSource;
