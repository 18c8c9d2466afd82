//! Range validation of resolved candidates.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::format;
use crate::resolve::Candidate;

pub const GRADE_RANGE: RangeInclusive<i64> = 1..=3;
pub const CLASSROOM_RANGE: RangeInclusive<i64> = 1..=9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("grade is missing")]
    MissingGrade,
    #[error("classroom is missing")]
    MissingClassroom,
    #[error("grade {0} is outside 1..=3")]
    GradeOutOfRange(i64),
    #[error("classroom {0} is outside 1..=9")]
    ClassroomOutOfRange(i64),
}

impl ValidationError {
    /// User-facing guidance shown in place of a timetable.
    pub fn guidance(&self) -> &'static str {
        format::GUIDANCE
    }
}

/// A grade/classroom pair that passed range validation, plus the day offset.
///
/// Only constructible through [`validate`] or [`ResolvedQuery::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedQuery {
    grade: u8,
    classroom: u8,
    day_offset: u32,
}

impl ResolvedQuery {
    pub fn try_new(grade: i64, classroom: i64, day_offset: u32) -> Result<Self, ValidationError> {
        if !GRADE_RANGE.contains(&grade) {
            return Err(ValidationError::GradeOutOfRange(grade));
        }
        if !CLASSROOM_RANGE.contains(&classroom) {
            return Err(ValidationError::ClassroomOutOfRange(classroom));
        }
        Ok(Self {
            grade: grade as u8,
            classroom: classroom as u8,
            day_offset,
        })
    }

    pub fn grade(&self) -> u8 {
        self.grade
    }

    pub fn classroom(&self) -> u8 {
        self.classroom
    }

    pub fn day_offset(&self) -> u32 {
        self.day_offset
    }
}

pub fn validate(candidate: &Candidate) -> Result<ResolvedQuery, ValidationError> {
    let grade = candidate.grade.ok_or(ValidationError::MissingGrade)?;
    let classroom = candidate.classroom.ok_or(ValidationError::MissingClassroom)?;
    ResolvedQuery::try_new(grade, classroom, candidate.day_offset)
}
