#![doc = "Canvas REST client: bridges the core's AssignmentSource trait to the real API over HTTPS."]
//
//! # Canvas client (CLI <-> Core)
//!
//! Implements [`AssignmentSource`] against `{api_host}/api/v1`. Every request
//! carries `Authorization: Bearer <token>`.
//!
//! - Construct with [`CanvasClient::from_settings`]; `CANVAS_ACCESS_TOKEN` in
//!   the environment wins over the stored token. The binary loads `.env`
//!   once at startup; this module only reads the process environment.
//! - The core pages with zero-based indices; Canvas numbers pages from 1, so
//!   index `n` is sent as `page=n+1`.
//! - No retries. Network failures, non-2xx statuses and undecodable bodies
//!   come back as [`TransportError`].

use std::env;

use async_trait::async_trait;
use canvas_notes_core::assignment::RemoteAssignment;
use canvas_notes_core::contract::{AssignmentPage, AssignmentSource};
use canvas_notes_core::error::TransportError;
use canvas_notes_core::pagination::{ResponseHeaders, PAGE_SIZE};
use canvas_notes_core::settings::Settings;
use serde::de::DeserializeOwned;

pub const TOKEN_ENV: &str = "CANVAS_ACCESS_TOKEN";

pub struct CanvasClient {
    http: reqwest::Client,
    api_host: String,
    access_token: String,
}

impl CanvasClient {
    pub fn new(api_host: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_host: api_host.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn from_settings(
        settings: &Settings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let token = match env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::info!("Using access token from {}", TOKEN_ENV);
                token.trim().to_string()
            }
            _ => settings.access_token.clone(),
        };
        if token.is_empty() {
            tracing::error!("No Canvas access token configured");
            return Err(format!(
                "no access token: run `configure --access-token` or set {TOKEN_ENV}"
            )
            .into());
        }
        tracing::info!(api_host = %settings.api_host, "Initialized CanvasClient");
        Ok(Self::new(&settings.api_host, &token))
    }

    fn assignments_url(&self, course_id: u64) -> String {
        format!("{}/api/v1/courses/{}/assignments", self.api_host, course_id)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(T, ResponseHeaders), TransportError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url, "Canvas request failed");
                TransportError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, url, "Canvas API returned error");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers: ResponseHeaders = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.json::<T>().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Failed to decode Canvas response");
            TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok((body, headers))
    }
}

#[async_trait]
impl AssignmentSource for CanvasClient {
    async fn fetch_page(
        &self,
        course_id: u64,
        page: u32,
    ) -> Result<AssignmentPage, TransportError> {
        let url = format!(
            "{}?page={}&per_page={}",
            self.assignments_url(course_id),
            page + 1,
            PAGE_SIZE
        );
        tracing::info!(course_id, page, "Fetching assignment page");
        let (assignments, headers): (Vec<RemoteAssignment>, _) = self.get(&url).await?;
        tracing::debug!(course_id, page, count = assignments.len(), "Fetched assignment page");
        Ok(AssignmentPage {
            assignments,
            headers,
        })
    }

    async fn fetch_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<RemoteAssignment, TransportError> {
        let url = format!("{}/{}", self.assignments_url(course_id), assignment_id);
        tracing::info!(course_id, assignment_id, "Fetching assignment");
        let (assignment, _) = self.get(&url).await?;
        Ok(assignment)
    }
}
