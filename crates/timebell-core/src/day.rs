//! Day resolution in Korea Standard Time.
//!
//! KST is a fixed UTC+9 offset with no daylight saving, so the conversion is
//! applied explicitly instead of relying on the host timezone. A request at
//! 23:30 UTC already falls on the next KST calendar day.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};

pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Korean weekday names, Sunday first.
pub const WEEKDAYS: [&str; 7] = [
    "일요일", "월요일", "화요일", "수요일", "목요일", "금요일", "토요일",
];

pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The calendar day a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    pub weekday: &'static str,
    /// Timetable weekday index (Monday = 0 .. Friday = 4); `None` on weekends.
    pub index: Option<usize>,
}

/// Map a weekday name to its timetable index.
pub fn lesson_index(weekday: &str) -> Option<usize> {
    match weekday {
        "월요일" => Some(0),
        "화요일" => Some(1),
        "수요일" => Some(2),
        "목요일" => Some(3),
        "금요일" => Some(4),
        _ => None,
    }
}

/// Resolve `offset` days after the current KST date.
pub fn resolve_day(now: DateTime<Utc>, offset: u32) -> ResolvedDay {
    let today = now.with_timezone(&kst()).date_naive();
    // Offsets are 0 or 1; overflow would need a date near the end of chrono's range.
    let date = today
        .checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(today);
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    ResolvedDay {
        date,
        weekday,
        index: lesson_index(weekday),
    }
}
