use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;
use timebell_core::{ScheduleTable, SkillRequest, SkillResponse, format, interpret};
use timebell_source::SourceError;
use tracing::{debug, error, info, warn};

use crate::AppState;

type Reply = (StatusCode, Json<SkillResponse>);

fn reply(status: StatusCode, text: impl Into<String>) -> Reply {
    (status, Json(SkillResponse::simple_text(text)))
}

/// `POST /api/timeTable`.
///
/// Every path ends in a reply envelope. Only the warming-up reply uses a
/// non-200 status.
pub async fn timetable(State(state): State<AppState>, body: Bytes) -> Reply {
    if !state.gate.is_ready() {
        warn!("timetable requested before the schedule source is ready");
        return reply(StatusCode::SERVICE_UNAVAILABLE, format::WARMING_UP);
    }

    let value = serde_json::from_slice::<Value>(&body).unwrap_or_else(|err| {
        warn!(error = %err, "request body is not valid JSON");
        Value::Null
    });
    debug!(body = %value, "skill request");

    let plan = interpret(&SkillRequest::from_value(value), state.clock.now());
    if let Some(text) = plan.terminal_reply() {
        return reply(StatusCode::OK, text);
    }

    match fetch_table(&state).await {
        Ok(table) => {
            let text = plan.render(&table);
            let school = state.gate.school().map(|s| s.name).unwrap_or_default();
            info!(%school, lines = text.lines().count(), "timetable reply ready");
            reply(StatusCode::OK, text)
        }
        Err(err) => {
            error!(error = %err, "timetable fetch failed");
            reply(StatusCode::OK, format::FETCH_FAILED)
        }
    }
}

async fn fetch_table(state: &AppState) -> Result<Arc<ScheduleTable>, SourceError> {
    tokio::time::timeout(
        state.fetch_timeout,
        state.cache.get_or_fetch(state.source.as_ref()),
    )
    .await
    .map_err(|_| SourceError::Timeout(state.fetch_timeout))?
}

/// `GET /healthz`.
pub async fn healthz() -> &'static str {
    "OK"
}
