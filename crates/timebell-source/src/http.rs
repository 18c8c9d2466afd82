//! HTTP client for a timetable gateway that fronts the upstream scraper.
//!
//! Endpoints, relative to the base URL:
//!
//! - `GET /schools?name=<query>` → `[{ "name": .., "code": .. }]`
//! - `GET /schools/<code>/timetable` → raw grade/classroom/weekday table
//!
//! The cache TTL handed to `initialize` is forwarded as `Cache-Control: max-age`
//! so the gateway may answer from its own cache.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use timebell_core::ScheduleTable;
use tokio::sync::RwLock;
use tracing::info;

use crate::{School, ScheduleSource, SourceError, SourceOptions};

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    max_age: RwLock<Option<Duration>>,
    selected: RwLock<Option<String>>,
}

impl HttpSource {
    /// `base_url` should be like `http://localhost:4000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_age: RwLock::new(None),
            selected: RwLock::new(None),
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, SourceError> {
        let mut request = self.client.get(url).query(query);
        if let Some(max_age) = *self.max_age.read().await {
            request = request.header(
                reqwest::header::CACHE_CONTROL,
                format!("max-age={}", max_age.as_secs()),
            );
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ScheduleSource for HttpSource {
    async fn initialize(&self, options: &SourceOptions) -> Result<(), SourceError> {
        *self.max_age.write().await = Some(options.cache_ttl);
        Ok(())
    }

    async fn search(&self, school_name: &str) -> Result<Vec<School>, SourceError> {
        let url = format!("{}/schools", self.base_url);
        info!(url = %url, query = school_name, "searching schools");
        let value = self.get_json(&url, &[("name", school_name)]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn select_school(&self, code: &str) -> Result<(), SourceError> {
        *self.selected.write().await = Some(code.to_string());
        Ok(())
    }

    async fn fetch_full_timetable(&self) -> Result<ScheduleTable, SourceError> {
        let code = self
            .selected
            .read()
            .await
            .clone()
            .ok_or(SourceError::NoSchoolSelected)?;
        let url = format!("{}/schools/{}/timetable", self.base_url, code);
        info!(url = %url, "fetching timetable");
        let raw = self.get_json(&url, &[]).await?;
        Ok(ScheduleTable::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let source = HttpSource::new("http://localhost:4000/".into());
        assert_eq!(source.base_url, "http://localhost:4000");
    }

    #[tokio::test]
    async fn fetch_requires_selection() {
        let source = HttpSource::new("http://localhost:4000".into());
        assert!(matches!(
            source.fetch_full_timetable().await,
            Err(SourceError::NoSchoolSelected)
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_http_error() {
        let source = HttpSource::new("http://127.0.0.1:1".into());
        assert!(matches!(
            source.search("불곡고").await,
            Err(SourceError::Http(_))
        ));
    }
}
