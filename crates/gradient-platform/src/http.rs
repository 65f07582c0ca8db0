//! HTTP implementation of the platform client.
//!
//! Talks to the platform's REST control API with a hand-rolled hyper
//! http1 client, one connection per request. The readiness wait is the
//! only polling operation; everything else is a single round trip.

use std::time::Duration;

use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use tracing::debug;

use gradient_core::types::{
    ConditionState, Revision, Service, ServiceRef, TrafficTarget,
};

use crate::client::{PlatformClient, PlatformError, PlatformResult};

/// Interval between readiness polls.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default bound on the readiness wait.
const READY_TIMEOUT: Duration = Duration::from_secs(300);

/// Platform client over the REST control API.
pub struct HttpClient {
    /// Authority of the control API, e.g. `127.0.0.1:9090`.
    authority: String,
    /// Bearer token passed through from the credentials reference.
    token: Option<String>,
    ready_timeout: Duration,
}

impl HttpClient {
    /// Create a client against `endpoint` (`http://host:port`).
    pub fn new(endpoint: &str, token: Option<String>) -> PlatformResult<Self> {
        let authority = endpoint
            .strip_prefix("http://")
            .ok_or_else(|| {
                PlatformError::Transport(format!("unsupported endpoint: {endpoint}"))
            })?
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            authority,
            token,
            ready_timeout: READY_TIMEOUT,
        })
    }

    /// Override the readiness-wait bound.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    fn service_path(svc: &ServiceRef) -> String {
        format!(
            "/v1/projects/{}/regions/{}/services/{}",
            svc.project, svc.region, svc.service
        )
    }

    /// One request, one connection. Returns status and body bytes.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> PlatformResult<(u16, bytes::Bytes)> {
        let stream = tokio::net::TcpStream::connect(&self.authority)
            .await
            .map_err(|e| PlatformError::Transport(format!("connect {}: {e}", self.authority)))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| PlatformError::Transport(format!("handshake: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(path)
            .header("host", &self.authority)
            .header("content-type", "application/json")
            .header("user-agent", "gradient/0.1");
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = builder
            .body(http_body_util::Full::new(bytes::Bytes::from(
                body.unwrap_or_default(),
            )))
            .map_err(|e| PlatformError::Transport(format!("build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| PlatformError::Transport(format!("send {method} {path}: {e}")))?;

        let status = resp.status().as_u16();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| PlatformError::Transport(format!("read body: {e}")))?
            .to_bytes();

        debug!(method, path, status, "platform api call");
        Ok((status, bytes))
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &bytes::Bytes) -> PlatformResult<T> {
        serde_json::from_slice(bytes).map_err(|e| PlatformError::Decode(e.to_string()))
    }

    fn api_error(status: u16, bytes: &bytes::Bytes) -> PlatformError {
        PlatformError::Api {
            status,
            message: String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl PlatformClient for HttpClient {
    async fn get_service(&self, svc: &ServiceRef) -> PlatformResult<Service> {
        let (status, body) = self.request("GET", &Self::service_path(svc), None).await?;
        match status {
            200 => Self::decode(&body),
            404 => Err(PlatformError::ServiceNotFound(svc.clone())),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    async fn create_or_update_service(
        &self,
        svc: &ServiceRef,
        desired: &Service,
    ) -> PlatformResult<Service> {
        let payload = serde_json::to_vec(desired).map_err(|e| PlatformError::Decode(e.to_string()))?;
        let (status, body) = self
            .request("PUT", &Self::service_path(svc), Some(payload))
            .await?;
        match status {
            200 | 201 => Self::decode(&body),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    async fn update_traffic(
        &self,
        svc: &ServiceRef,
        traffic: &[TrafficTarget],
    ) -> PlatformResult<()> {
        let payload = serde_json::to_vec(traffic).map_err(|e| PlatformError::Decode(e.to_string()))?;
        let path = format!("{}/traffic", Self::service_path(svc));
        let (status, body) = self.request("PUT", &path, Some(payload)).await?;
        match status {
            200 | 204 => Ok(()),
            404 => Err(PlatformError::ServiceNotFound(svc.clone())),
            400 => Err(PlatformError::InvalidAllocation(
                String::from_utf8_lossy(&body).into_owned(),
            )),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    async fn list_revisions(&self, svc: &ServiceRef) -> PlatformResult<Vec<Revision>> {
        let path = format!("{}/revisions", Self::service_path(svc));
        let (status, body) = self.request("GET", &path, None).await?;
        match status {
            200 => Self::decode(&body),
            404 => Err(PlatformError::ServiceNotFound(svc.clone())),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    async fn get_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<Revision> {
        let path = format!("{}/revisions/{revision}", Self::service_path(svc));
        let (status, body) = self.request("GET", &path, None).await?;
        match status {
            200 => Self::decode(&body),
            404 => Err(PlatformError::RevisionNotFound(revision.to_string())),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    async fn delete_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<()> {
        let path = format!("{}/revisions/{revision}", Self::service_path(svc));
        let (status, body) = self.request("DELETE", &path, None).await?;
        match status {
            200 | 204 => Ok(()),
            404 => Err(PlatformError::RevisionNotFound(revision.to_string())),
            _ => Err(Self::api_error(status, &body)),
        }
    }

    /// Poll until the service reports a terminal `Ready` condition.
    ///
    /// Readiness is asynchronous on the platform side, so this is a
    /// bounded poll rather than a one-shot check. Cancellation is the
    /// caller's concern: dropping this future aborts the poll.
    async fn wait_for_service_ready(&self, svc: &ServiceRef) -> PlatformResult<()> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;
        let mut ticker = tokio::time::interval(READY_POLL_INTERVAL);
        // The first tick fires immediately.
        loop {
            ticker.tick().await;
            if tokio::time::Instant::now() >= deadline {
                return Err(PlatformError::ReadyTimeout(self.ready_timeout.as_secs()));
            }

            let service = self.get_service(svc).await?;
            if let Some(ready) = service.ready_condition() {
                match ready.state {
                    ConditionState::Succeeded => return Ok(()),
                    ConditionState::Failed => {
                        return Err(PlatformError::NotReady(ready.message.clone()));
                    }
                    ConditionState::Pending => {
                        debug!(service = %svc, "service not ready yet");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(HttpClient::new("https://api.example.com", None).is_err());
        assert!(HttpClient::new("api.example.com:9090", None).is_err());
    }

    #[test]
    fn builds_service_paths() {
        let svc = ServiceRef::new("proj", "eu-west1", "api");
        assert_eq!(
            HttpClient::service_path(&svc),
            "/v1/projects/proj/regions/eu-west1/services/api"
        );
    }

    #[test]
    fn strips_trailing_slash_from_endpoint() {
        let client = HttpClient::new("http://127.0.0.1:9090/", None).unwrap();
        assert_eq!(client.authority, "127.0.0.1:9090");
    }
}
