//! Timetable model and normalisation of raw source data.
//!
//! Sources hand back loosely shaped JSON: each level of the
//! grade → classroom → weekday → periods nesting may be an object keyed by
//! decimal strings or an array indexed directly, and period entries spell
//! their fields several ways. [`ScheduleTable::from_raw`] converts that once
//! into fixed [`PeriodEntry`] values so lookups never deal with aliases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format::UNKNOWN_SUBJECT;

const PERIOD_KEYS: &[&str] = &["classTime", "time", "period", "시간", "교시"];
const SUBJECT_KEYS: &[&str] = &["subject", "subjectName", "name", "과목"];
const TEACHER_KEYS: &[&str] = &["teacher", "teacherName", "선생님"];

/// One class period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEntry {
    pub period: u32,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
}

impl PeriodEntry {
    pub fn new(period: u32, subject: impl Into<String>) -> Self {
        Self {
            period,
            subject: subject.into(),
            teacher: None,
        }
    }

    /// Normalise one raw entry. `position` is the entry's zero-based index in
    /// its day and stands in for a missing period number.
    pub fn from_raw(raw: &Map<String, Value>, position: usize) -> Self {
        let period = first_field(raw, PERIOD_KEYS, as_number).unwrap_or(position as u32 + 1);
        let subject =
            first_field(raw, SUBJECT_KEYS, as_text).unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());
        let teacher = first_field(raw, TEACHER_KEYS, as_text);
        Self {
            period,
            subject,
            teacher,
        }
    }
}

/// First alias whose value parses; unusable spellings fall through to the next.
fn first_field<T>(
    raw: &Map<String, Value>,
    keys: &[&str],
    parse: fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter().filter_map(|k| raw.get(*k)).find_map(parse)
}

fn as_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

type Days = BTreeMap<usize, Vec<PeriodEntry>>;

/// Normalised grade → classroom → weekday index → periods table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    grades: BTreeMap<u32, BTreeMap<u32, Days>>,
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw source JSON. Unrecognised shapes at any level
    /// are skipped rather than rejected.
    pub fn from_raw(raw: &Value) -> Self {
        let mut table = Self::new();
        for (grade, classes) in numbered_children(raw) {
            for (classroom, days) in numbered_children(classes) {
                for (day, periods) in numbered_children(days) {
                    let Some(periods) = periods.as_array() else {
                        continue;
                    };
                    let entries = periods
                        .iter()
                        .enumerate()
                        .filter_map(|(pos, p)| p.as_object().map(|o| PeriodEntry::from_raw(o, pos)))
                        .collect();
                    table.insert(grade, classroom, day as usize, entries);
                }
            }
        }
        table
    }

    pub fn insert(&mut self, grade: u32, classroom: u32, day: usize, entries: Vec<PeriodEntry>) {
        self.grades
            .entry(grade)
            .or_default()
            .entry(classroom)
            .or_default()
            .insert(day, entries);
    }

    /// Periods for one class on one weekday, in source order.
    ///
    /// Any missing level yields an empty slice.
    pub fn lookup(&self, grade: u32, classroom: u32, day: usize) -> &[PeriodEntry] {
        let Some(classes) = self.grades.get(&grade) else {
            return &[];
        };
        let Some(days) = classes.get(&classroom) else {
            return &[];
        };
        days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn grade_count(&self) -> usize {
        self.grades.len()
    }
}

fn numbered_children(value: &Value) -> Vec<(u32, &Value)> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| k.trim().parse().ok().map(|n| (n, v)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i as u32, v))
            .collect(),
        _ => Vec::new(),
    }
}
