//! Request pipeline up to the schedule lookup.
//!
//! [`interpret`] runs resolution, validation and day resolution. It either
//! ends in a terminal reply (guidance or no-lessons) or hands back a lookup
//! plan; the caller fetches the table and finishes with [`Interpretation::render`].

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::day::{ResolvedDay, resolve_day};
use crate::envelope::SkillRequest;
use crate::format;
use crate::resolve::resolve;
use crate::schedule::ScheduleTable;
use crate::validate::{ResolvedQuery, ValidationError, validate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// Grade or classroom missing or out of range.
    Invalid(ValidationError),
    /// The target day has no lessons; no lookup is needed.
    NoLessons { query: ResolvedQuery, day: ResolvedDay },
    /// Look up `index` in the table for `query`.
    Lookup {
        query: ResolvedQuery,
        day: ResolvedDay,
        index: usize,
    },
}

impl Interpretation {
    /// Reply text for terminal outcomes; `None` when a lookup is still needed.
    pub fn terminal_reply(&self) -> Option<String> {
        match self {
            Self::Invalid(err) => Some(err.guidance().to_string()),
            Self::NoLessons { day, .. } => Some(format::weekend_message(day.weekday)),
            Self::Lookup { .. } => None,
        }
    }

    /// Final reply text given the fetched table.
    pub fn render(&self, table: &ScheduleTable) -> String {
        match self {
            Self::Lookup { query, day, index } => {
                let entries = table.lookup(
                    u32::from(query.grade()),
                    u32::from(query.classroom()),
                    *index,
                );
                format::schedule_message(day.weekday, query, entries)
            }
            terminal => terminal.terminal_reply().unwrap_or_default(),
        }
    }
}

pub fn interpret(request: &SkillRequest, now: DateTime<Utc>) -> Interpretation {
    let candidate = resolve(request);
    debug!(
        grade = ?candidate.grade,
        classroom = ?candidate.classroom,
        day_offset = candidate.day_offset,
        origin = candidate.origin.as_str(),
        "resolved request parameters"
    );

    let query = match validate(&candidate) {
        Ok(query) => query,
        Err(err) => return Interpretation::Invalid(err),
    };

    let day = resolve_day(now, query.day_offset());
    debug!(
        day_offset = query.day_offset(),
        weekday = day.weekday,
        index = ?day.index,
        "resolved target day"
    );

    match day.index {
        Some(index) => Interpretation::Lookup { query, day, index },
        None => Interpretation::NoLessons { query, day },
    }
}
