//! Chatbot skill envelope: the inbound request payload and the outbound
//! `simpleText` reply.
//!
//! Inbound fields are untrusted. Structured parameters arrive as JSON numbers
//! or strings depending on how the bot block was configured, so they are kept
//! as raw [`Value`]s and read through the lenient accessors below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply envelope version expected by the chatbot platform.
pub const ENVELOPE_VERSION: &str = "2.0";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub user_request: Option<UserRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub params: Option<Params>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub grade: Option<Value>,
    #[serde(default)]
    pub classroom: Option<Value>,
    #[serde(default)]
    pub day: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub utterance: Option<String>,
}

impl SkillRequest {
    /// Parse a request body, treating anything that does not fit the envelope
    /// as an empty request.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    fn params(&self) -> Option<&Params> {
        self.action.as_ref().and_then(|a| a.params.as_ref())
    }

    pub fn structured_grade(&self) -> Option<i64> {
        self.params()
            .and_then(|p| p.grade.as_ref())
            .and_then(parse_loose_int)
    }

    pub fn structured_classroom(&self) -> Option<i64> {
        self.params()
            .and_then(|p| p.classroom.as_ref())
            .and_then(parse_loose_int)
    }

    /// The structured day parameter, trimmed and lowercased.
    pub fn structured_day(&self) -> Option<String> {
        self.params()
            .and_then(|p| p.day.as_ref())
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Raw user utterance, empty when absent.
    pub fn utterance(&self) -> &str {
        self.user_request
            .as_ref()
            .and_then(|u| u.utterance.as_deref())
            .unwrap_or("")
    }
}

/// Read an integer from a JSON number or from the leading decimal digits of a
/// string (`"2"`, `" 2학년"`, `"-1"`).
///
/// Numbers with a fractional part and strings without leading digits yield `None`.
pub fn parse_loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, rest) = match s.as_bytes().first() {
                Some(b'-') => (-1, &s[1..]),
                Some(b'+') => (1, &s[1..]),
                _ => (1, s),
            };
            let end = rest
                .as_bytes()
                .iter()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(rest.len());
            if end == 0 {
                return None;
            }
            rest[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

/// Outbound reply envelope carrying one `simpleText` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub version: String,
    pub template: Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub simple_text: SimpleText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleText {
    pub text: String,
}

impl SkillResponse {
    pub fn simple_text(text: impl Into<String>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            template: Template {
                outputs: vec![Output {
                    simple_text: SimpleText { text: text.into() },
                }],
            },
        }
    }

    /// Text of the first output, if any.
    pub fn text(&self) -> Option<&str> {
        self.template
            .outputs
            .first()
            .map(|o| o.simple_text.text.as_str())
    }
}
