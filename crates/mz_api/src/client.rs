//! HTTP client for the consensus API.
//!
//! All requests go through [`ApiClient`], which attaches credentials and
//! normalises failures into [`ApiError`] values carrying a user-facing
//! message.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::sse::ChatStream;
use crate::types::{
    ApiKeySummary, ApiKeysResponse, ChatSendRequest, ChatSendResponse, CreateApiKeyRequest,
    CreatedApiKey, HealthReport, HealthStatus, MissionRequest, MissionResponse, ModelOption,
    ModelsResponse, UserProfile,
};

/// Client for the consensus API.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-Key", key);
        }
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!(status = status.as_u16(), %message, "API request failed");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        warn!(base_url = %self.config.base_url, error = %err, "API unreachable");
        ApiError::Connect {
            base_url: self.config.base_url.clone(),
        }
    }

    /// `POST` a JSON body and decode the JSON reply.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        debug!(%url, "POST");
        let response = self.execute(self.client.post(&url).json(body)).await?;
        decode(response).await
    }

    /// `GET` and decode the JSON reply.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.config.url(path);
        debug!(%url, "GET");
        let response = self.execute(self.client.get(&url)).await?;
        decode(response).await
    }

    /// `DELETE` a resource, ignoring any reply body.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.config.url(path);
        debug!(%url, "DELETE");
        self.execute(self.client.delete(&url)).await?;
        Ok(())
    }

    /// URL of the event stream for a chat message.
    pub fn chat_stream_url(&self, message_id: &str) -> ApiResult<String> {
        let mut url = reqwest::Url::parse(&self.config.url("/api/chat/stream"))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("message_id", message_id);
            if let Some(key) = &self.config.api_key {
                query.append_pair("token", key);
            }
        }
        Ok(url.to_string())
    }

    /// Subscribe to the event stream of a chat message.
    pub async fn open_chat_stream(&self, message_id: &str) -> ApiResult<ChatStream> {
        let url = self.chat_stream_url(message_id)?;
        debug!(%message_id, "Opening chat stream");
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let response = self.execute(request).await?;
        Ok(ChatStream::from_response(response))
    }

    /// Submit a fast-mode chat turn.
    pub async fn send_chat(&self, request: &ChatSendRequest) -> ApiResult<ChatSendResponse> {
        self.post_json("/api/chat/send", request).await
    }

    /// Run a mission through the consensus engine, bounded by the configured deadline.
    pub async fn run_mission(&self, request: &MissionRequest) -> ApiResult<MissionResponse> {
        debug!(
            files = request.context.attached_files.len(),
            "Running consensus mission"
        );
        with_deadline(
            self.config.mission_timeout,
            self.post_json("/run-custom", request),
        )
        .await
    }

    /// Models offered by the backend.
    pub async fn list_models(&self) -> ApiResult<Vec<ModelOption>> {
        let response: ModelsResponse = self.get_json("/api/chat/models").await?;
        Ok(response.models)
    }

    /// Probe `/health`, measuring round-trip latency.
    pub async fn health(&self) -> ApiResult<HealthReport> {
        let started = Instant::now();
        let status: HealthStatus = self.get_json("/health").await?;
        Ok(HealthReport {
            status,
            latency_ms: started.elapsed().as_millis(),
        })
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.get_json("/auth/me").await
    }

    pub async fn list_api_keys(&self) -> ApiResult<Vec<ApiKeySummary>> {
        let response: ApiKeysResponse = self.get_json("/user/api-keys").await?;
        Ok(response.keys)
    }

    pub async fn create_api_key(&self, name: &str) -> ApiResult<CreatedApiKey> {
        let request = CreateApiKeyRequest {
            name: name.to_string(),
        };
        self.post_json("/user/api-keys", &request).await
    }

    pub async fn delete_api_key(&self, key_id: &str) -> ApiResult<()> {
        self.delete(&format!("/user/api-keys/{}", key_id)).await
    }
}

/// Race a request against a deadline.
pub async fn with_deadline<T, F>(deadline: Duration, request: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(deadline, request).await {
        Ok(result) => result,
        Err(_) => {
            warn!(seconds = deadline.as_secs(), "Mission deadline elapsed");
            Err(ApiError::Timeout(deadline.as_secs()))
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(serde_json::from_str(&body)?)
}

/// Extract a user-facing message from an error response.
///
/// Prefers a `detail` or `message` string field of a JSON body, then the raw
/// body, then the status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message"] {
            match json.get(field) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(value) if !value.is_null() && !value.is_string() => {
                    return value.to_string()
                }
                _ => {}
            }
        }
    }

    if !body.trim().is_empty() {
        return body.to_string();
    }

    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_detail() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Invalid model", "message": "ignored"}"#,
        );
        assert_eq!(msg, "Invalid model");
    }

    #[test]
    fn test_error_message_uses_message_field() {
        let msg = error_message(StatusCode::UNAUTHORIZED, r#"{"message": "Bad key"}"#);
        assert_eq!(msg, "Bad key");
    }

    #[test]
    fn test_error_message_structured_detail() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "task"]}]}"#,
        );
        assert!(msg.contains("task"));
    }

    #[test]
    fn test_error_message_raw_body() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(msg, "upstream down");

        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error": "x"}"#);
        assert_eq!(msg, r#"{"error": "x"}"#);
    }

    #[test]
    fn test_error_message_status_line() {
        let msg = error_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(msg, "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_stream_url_carries_token() {
        let client = ApiClient::new(ApiConfig::new("http://localhost:9000").api_key("k&1"));
        let url = client.chat_stream_url("msg 1").unwrap();
        assert_eq!(
            url,
            "http://localhost:9000/api/chat/stream?message_id=msg+1&token=k%261"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_rejects_hung_request() {
        let started = tokio::time::Instant::now();
        let result: ApiResult<()> = with_deadline(
            Duration::from_millis(120_000),
            std::future::pending::<ApiResult<()>>(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("120s"));
        assert!(err.to_string().contains("Try again"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(120));
        assert!(elapsed < Duration::from_secs(121));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_passes_through_fast_result() {
        let result = with_deadline(Duration::from_secs(120), async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
