// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP worker channel
//!
//! Blocking `ureq` calls run on the blocking pool and are bounded by the
//! configured timeout. JSON bodies use the controller's camelCase names.

use super::WorkerChannel;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sked_core::{
    AgentDefinition, AgentHealth, JobDefinition, JobIteration, JobMetadata, JobStatus,
    JobStatusExchangeRequest, JobStatusExchangeResponse,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a controller call produced nothing
#[derive(Debug, Error)]
enum HttpError {
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to read response: {0}")]
    Read(String),
    #[error("empty response")]
    Empty,
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("request task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone)]
struct HttpRequest {
    method: Method,
    url: String,
    query: Option<(&'static str, String)>,
    body: Option<String>,
}

/// Worker channel over the controller's REST API
#[derive(Clone)]
pub struct HttpWorkerChannel {
    base_url: Arc<str>,
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpWorkerChannel {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            agent: ureq::Agent::new_with_config(config),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: (&'static str, &str)) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: self.url(path),
            query: Some((query.0, query.1.to_string())),
            body: None,
        }
    }

    fn with_body(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> Result<HttpRequest, HttpError> {
        let body = serde_json::to_string(body).map_err(|e| HttpError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: self.url(path),
            query: None,
            body: Some(body),
        })
    }

    async fn call<T>(&self, request: Result<HttpRequest, HttpError>) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "controller call not sent");
                return None;
            }
        };
        let method = request.method;
        let url = request.url.clone();

        match self.exchange::<T>(request).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(?method, url = %url, error = %e, "controller call failed");
                None
            }
        }
    }

    async fn exchange<T>(&self, request: HttpRequest) -> Result<T, HttpError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let task = tokio::task::spawn_blocking(move || send_blocking(&agent, &request));
        let body = tokio::time::timeout(self.timeout, task)
            .await
            .map_err(|_| HttpError::Timeout(self.timeout))?
            .map_err(|e| HttpError::Join(e.to_string()))??;

        if body.trim().is_empty() {
            return Err(HttpError::Empty);
        }
        serde_json::from_str(&body).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

fn send_blocking(agent: &ureq::Agent, request: &HttpRequest) -> Result<String, HttpError> {
    let body = request.body.as_deref().unwrap_or_default();
    let result = match request.method {
        Method::Get => {
            let mut builder = agent.get(&request.url);
            if let Some((key, value)) = &request.query {
                builder = builder.query(*key, value);
            }
            builder.call()
        }
        Method::Post => agent
            .post(&request.url)
            .header("Content-Type", "application/json")
            .send(body),
        Method::Put => agent
            .put(&request.url)
            .header("Content-Type", "application/json")
            .send(body),
    };

    let mut response = result.map_err(|e| HttpError::Transport(e.to_string()))?;
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| HttpError::Read(e.to_string()))
}

#[derive(Serialize)]
struct StatusUpdate {
    status: JobStatus,
}

#[async_trait]
impl WorkerChannel for HttpWorkerChannel {
    async fn registration(&self, agent: AgentDefinition) -> Option<AgentDefinition> {
        self.call(self.with_body(Method::Post, "/agents", &agent)).await
    }

    async fn heartbeat(&self, agent_id: &str, health: AgentHealth) -> Option<AgentDefinition> {
        let path = format!("/agents/{}/health", urlencoding::encode(agent_id));
        self.call(self.with_body(Method::Put, &path, &health)).await
    }

    async fn metadata(&self, cluster: &str) -> Option<JobMetadata> {
        self.call(Ok(self.get("/jobs/metadata", ("cluster", cluster))))
            .await
    }

    async fn status_exchange(
        &self,
        request: JobStatusExchangeRequest,
    ) -> Option<JobStatusExchangeResponse> {
        self.call(self.with_body(Method::Post, "/jobs/exchange", &request))
            .await
    }

    async fn iterate(&self, iteration: JobIteration) -> Option<JobIteration> {
        self.call(self.with_body(Method::Post, "/iterations", &iteration))
            .await
    }

    async fn mark_as(&self, job_id: &str, status: JobStatus) -> Option<JobDefinition> {
        let path = format!("/jobs/{}/status", urlencoding::encode(job_id));
        self.call(self.with_body(Method::Put, &path, &StatusUpdate { status }))
            .await
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
