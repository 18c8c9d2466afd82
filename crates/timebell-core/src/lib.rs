//! Core of the timebell schedule skill: request interpretation, day resolution,
//! timetable normalisation and reply formatting. No I/O.

pub mod day;
pub mod envelope;
pub mod format;
pub mod pipeline;
pub mod resolve;
pub mod schedule;
pub mod validate;

pub use day::{Clock, FixedClock, ResolvedDay, SystemClock, resolve_day};
pub use envelope::{SkillRequest, SkillResponse};
pub use pipeline::{Interpretation, interpret};
pub use resolve::{Candidate, Origin, resolve};
pub use schedule::{PeriodEntry, ScheduleTable};
pub use validate::{ResolvedQuery, ValidationError, validate};
