//! Reply text shown to chatbot users.

use crate::schedule::PeriodEntry;
use crate::validate::ResolvedQuery;

pub const WARMING_UP: &str = "⚠️ 서버 초기화 중입니다. 잠시 후 다시 시도해주세요.";
pub const GUIDANCE: &str = "❌ 학년과 반 정보를 올바르게 입력해주세요. 예: 2학년 5반, 2-5";
pub const FETCH_FAILED: &str = "⚠️ 시간표를 불러오는 중 오류가 발생했어요.";
pub const NO_CLASSES: &str = "오늘은 수업이 없어요!";
pub const UNKNOWN_SUBJECT: &str = "알 수 없는 과목";

/// Informational reply for a day without lessons.
pub fn weekend_message(weekday: &str) -> String {
    format!("{weekday}은 수업이 없습니다! 💤")
}

pub fn schedule_header(weekday: &str, query: &ResolvedQuery) -> String {
    format!(
        "{weekday} — {}학년 {}반 시간표",
        query.grade(),
        query.classroom()
    )
}

/// Header, blank line, then one `N교시: subject` line per entry in the given order.
pub fn schedule_message(weekday: &str, query: &ResolvedQuery, entries: &[PeriodEntry]) -> String {
    let body = if entries.is_empty() {
        NO_CLASSES.to_string()
    } else {
        entries
            .iter()
            .map(|e| format!("{}교시: {}", e.period, e.subject))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("{}\n\n{body}", schedule_header(weekday, query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_periods_in_order() {
        let q = ResolvedQuery::try_new(2, 5, 0).unwrap();
        let entries = vec![PeriodEntry::new(1, "국어"), PeriodEntry::new(2, "수학")];
        assert_eq!(
            schedule_message("화요일", &q, &entries),
            "화요일 — 2학년 5반 시간표\n\n1교시: 국어\n2교시: 수학"
        );
    }

    #[test]
    fn empty_day_uses_placeholder() {
        let q = ResolvedQuery::try_new(1, 1, 0).unwrap();
        assert_eq!(
            schedule_message("월요일", &q, &[]),
            "월요일 — 1학년 1반 시간표\n\n오늘은 수업이 없어요!"
        );
    }

    #[test]
    fn weekend() {
        assert_eq!(weekend_message("토요일"), "토요일은 수업이 없습니다! 💤");
    }
}
