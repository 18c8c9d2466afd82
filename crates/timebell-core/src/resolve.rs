//! Parameter resolution: turn a skill request into a best-effort
//! (grade, classroom, day offset) candidate before validation.
//!
//! Structured parameters win when both grade and classroom are present and
//! numeric. Otherwise the utterance is scanned with three notations, in order:
//!
//! 1. `2학년 5반` (Korean, word separated)
//! 2. `2-5`, `2/5`, `2,5` (symbol separated)
//! 3. `2 5` (bare pair, digit bounded)
//!
//! The day offset defaults to today. A structured `tomorrow` moves it to 1,
//! and `내일` anywhere in the utterance forces 1 regardless of the structured day.

use std::sync::LazyLock;

use regex::Regex;

use crate::envelope::SkillRequest;

/// Utterance keyword selecting tomorrow's schedule.
pub const TOMORROW_KEYWORD: &str = "내일";

static KOREAN_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)([1-3])\s*학년\s*([1-9])\s*반").expect("valid KOREAN_PAIR regex")
});

static SYMBOL_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)([1-3])[-/,]([1-9])(?:\D|$)").expect("valid SYMBOL_PAIR regex")
});

// Digit-anchored rather than `\b`: Hangul counts as a word character, so `\b`
// would reject a pair that touches Korean text ("2 5반").
static BARE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)([1-3])\s+([1-9])(?:\D|$)").expect("valid BARE_PAIR regex")
});

/// Where the grade and classroom of a [`Candidate`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Structured,
    KoreanPair,
    SymbolPair,
    BarePair,
    /// Nothing usable in either the params or the utterance.
    Unresolved,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::KoreanPair => "korean_pair",
            Self::SymbolPair => "symbol_pair",
            Self::BarePair => "bare_pair",
            Self::Unresolved => "unresolved",
        }
    }
}

/// Unvalidated resolution result. Feed it to [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub grade: Option<i64>,
    pub classroom: Option<i64>,
    pub day_offset: u32,
    pub origin: Origin,
}

/// Resolve grade, classroom and day offset from a request.
pub fn resolve(request: &SkillRequest) -> Candidate {
    let utterance = request.utterance().to_lowercase();

    let mut grade = request.structured_grade();
    let mut classroom = request.structured_classroom();
    let mut origin = Origin::Structured;

    if grade.is_none() || classroom.is_none() {
        match extract_pair(&utterance) {
            Some((g, c, from)) => {
                grade = Some(g);
                classroom = Some(c);
                origin = from;
            }
            None if grade.is_none() && classroom.is_none() => origin = Origin::Unresolved,
            None => {}
        }
    }

    Candidate {
        grade,
        classroom,
        day_offset: resolve_day_offset(request.structured_day().as_deref(), &utterance),
        origin,
    }
}

/// Day offset from the structured day value and the (lowercased) utterance.
pub fn resolve_day_offset(structured_day: Option<&str>, utterance: &str) -> u32 {
    if utterance.contains(TOMORROW_KEYWORD) {
        return 1;
    }
    match structured_day {
        Some("tomorrow") | Some(TOMORROW_KEYWORD) => 1,
        _ => 0,
    }
}

/// Scan an utterance for a grade/classroom pair, highest-priority notation first.
pub fn extract_pair(utterance: &str) -> Option<(i64, i64, Origin)> {
    [
        (&*KOREAN_PAIR, Origin::KoreanPair),
        (&*SYMBOL_PAIR, Origin::SymbolPair),
        (&*BARE_PAIR, Origin::BarePair),
    ]
    .into_iter()
    .find_map(|(re, origin)| {
        let caps = re.captures(utterance)?;
        let grade = caps.get(1)?.as_str().parse().ok()?;
        let classroom = caps.get(2)?.as_str().parse().ok()?;
        Some((grade, classroom, origin))
    })
}
