//! Backend seam used by the controller.

use async_trait::async_trait;
use futures::stream::BoxStream;
use mz_api::{
    ApiClient, ApiResult, ChatSendRequest, ChatSendResponse, MissionRequest, MissionResponse,
    ModelOption, StreamEvent,
};

/// Operations the chat controller needs from the consensus API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsensusBackend: Send + Sync {
    /// Base URL shown in connection hints
    fn base_url(&self) -> String;

    async fn list_models(&self) -> ApiResult<Vec<ModelOption>>;

    async fn send_chat(&self, request: ChatSendRequest) -> ApiResult<ChatSendResponse>;

    /// Subscribe to a reply's event stream. The stream ends after its first
    /// terminal event.
    async fn open_stream(&self, message_id: String) -> ApiResult<BoxStream<'static, StreamEvent>>;

    async fn run_mission(&self, request: MissionRequest) -> ApiResult<MissionResponse>;
}

#[async_trait]
impl ConsensusBackend for ApiClient {
    fn base_url(&self) -> String {
        ApiClient::base_url(self).to_string()
    }

    async fn list_models(&self) -> ApiResult<Vec<ModelOption>> {
        ApiClient::list_models(self).await
    }

    async fn send_chat(&self, request: ChatSendRequest) -> ApiResult<ChatSendResponse> {
        ApiClient::send_chat(self, &request).await
    }

    async fn open_stream(&self, message_id: String) -> ApiResult<BoxStream<'static, StreamEvent>> {
        let stream = self.open_chat_stream(&message_id).await?;
        Ok(stream.into_events())
    }

    async fn run_mission(&self, request: MissionRequest) -> ApiResult<MissionResponse> {
        ApiClient::run_mission(self, &request).await
    }
}
