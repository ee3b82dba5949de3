use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::RwLock;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::SnapshotStore;
use crate::errors::CoreError;
use crate::models::dataset::Dataset;

const STORE_NAME: &str = "Remote";

/// Per-user snapshot store behind a REST API.
///
/// - `GET  {base}/user/data` returns the user's snapshot (or `null`)
/// - `POST {base}/user/data` replaces it
/// - `GET  {base}/health` is an unauthenticated liveness probe
///
/// Requests carry `Authorization: Bearer <token>` when a token is set. A
/// 401 response clears the token so the caller can ask the user to sign in
/// again. Authentication itself happens elsewhere.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Builder-style token setter.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// `true` when the health endpoint answers with a success status.
    /// Network failures count as unhealthy rather than as errors.
    pub async fn health(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %CoreError::from(e), "Remote health check failed");
                false
            }
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map non-success statuses to errors, dropping the token on 401.
    fn check_status(&self, resp: Response) -> Result<Response, CoreError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Remote store rejected the token; clearing it");
            self.clear_token();
            return Err(CoreError::Api {
                store: STORE_NAME.into(),
                message: "Unauthorized: sign in again".into(),
            });
        }
        if !status.is_success() {
            return Err(CoreError::Api {
                store: STORE_NAME.into(),
                message: format!("HTTP error: status {status}"),
            });
        }
        Ok(resp)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SnapshotStore for RemoteStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn load(&self) -> Result<Option<Dataset>, CoreError> {
        let request = self.authorized(self.client.get(self.url("/user/data")));
        let resp = self.check_status(request.send().await?)?;
        let body = resp.text().await?;

        if body.trim().is_empty() {
            return Ok(None);
        }
        let dataset: Option<Dataset> = serde_json::from_str(&body).map_err(|e| CoreError::Api {
            store: STORE_NAME.into(),
            message: format!("Failed to parse snapshot: {e}"),
        })?;
        debug!(found = dataset.is_some(), "Fetched remote snapshot");
        Ok(dataset)
    }

    async fn save(&self, dataset: &Dataset) -> Result<(), CoreError> {
        let request = self.authorized(self.client.post(self.url("/user/data")).json(dataset));
        self.check_status(request.send().await?)?;
        debug!("Uploaded remote snapshot");
        Ok(())
    }
}
