//! Integration tests for the chat controller.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::Query,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use mz_api::{
    ApiClient, ApiConfig, ApiResult, ChatSendRequest, ChatSendResponse, FinalEvent,
    MissionRequest, MissionResponse, ModelOption, StreamEvent,
};
use mz_chat::{
    dispatch, Action, ActionEffect, ChatController, ChatMode, Conversation, LocalStore, Message,
    MizziStatus, ReplyPhase, Role, SendOutcome, ViewSink, CONVERSATIONS_KEY,
};

#[derive(Clone, Default)]
struct RecordingView {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingView {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ViewSink for RecordingView {
    fn render(&self, conversation: &Conversation, _models: &[ModelOption]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("render:{}", conversation.messages.len()));
    }

    fn patch_last_assistant(&self, content: &str) {
        self.events.lock().unwrap().push(format!("patch:{}", content));
    }

    fn settle_last_assistant(&self, message: &Message, _models: &[ModelOption]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("settle:{}", message.content));
    }
}

/// Backend answering from a fixed script. `send_chat` can be held until
/// released.
#[derive(Default)]
struct ScriptedBackend {
    gate: Option<Arc<Notify>>,
    events: Vec<StreamEvent>,
    mission: Option<Value>,
}

#[async_trait]
impl mz_chat::ConsensusBackend for ScriptedBackend {
    fn base_url(&self) -> String {
        "http://scripted".to_string()
    }

    async fn list_models(&self) -> ApiResult<Vec<ModelOption>> {
        Ok(Vec::new())
    }

    async fn send_chat(&self, _request: ChatSendRequest) -> ApiResult<ChatSendResponse> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(ChatSendResponse {
            message_id: Some("msg-1".into()),
            ..Default::default()
        })
    }

    async fn open_stream(&self, _message_id: String) -> ApiResult<BoxStream<'static, StreamEvent>> {
        Ok(stream::iter(self.events.clone()).boxed())
    }

    async fn run_mission(&self, _request: MissionRequest) -> ApiResult<MissionResponse> {
        let value = self.mission.clone().unwrap_or_else(|| json!({ "status": "completed" }));
        Ok(serde_json::from_value(value).unwrap())
    }
}

fn final_event() -> StreamEvent {
    StreamEvent::Final(FinalEvent::default())
}

#[tokio::test]
async fn test_second_send_while_busy_is_ignored() {
    let temp = tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let backend = ScriptedBackend {
        gate: Some(gate.clone()),
        events: vec![StreamEvent::Chunk("ok".into()), final_event()],
        ..Default::default()
    };
    let controller = ChatController::mount(backend, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();

    let first = controller.send_message("first");
    let second = async {
        while !controller.is_busy() {
            tokio::task::yield_now().await;
        }
        let outcome = controller.send_message("second").await;
        gate.notify_one();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(
        first.unwrap(),
        SendOutcome::Replied { phase: ReplyPhase::Completed, .. }
    ));
    assert_eq!(second.unwrap(), SendOutcome::Busy);

    let conversation = controller.current_conversation().unwrap();
    let roles: Vec<_> = conversation.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(conversation.messages[0].content, "first");
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_stream_patches_view_then_settles_once() {
    let temp = tempdir().unwrap();
    let view = RecordingView::default();
    let backend = ScriptedBackend {
        events: vec![
            StreamEvent::Chunk("Hel".into()),
            StreamEvent::Chunk("lo".into()),
            final_event(),
        ],
        ..Default::default()
    };
    let controller = ChatController::mount(backend, view.clone(), LocalStore::new(temp.path()))
        .await
        .unwrap();

    controller.send_message("hi").await.unwrap();

    assert_eq!(
        view.events(),
        vec![
            "render:0",
            "render:1",
            "render:2",
            "patch:Hel",
            "patch:Hello",
            "settle:Hello",
        ]
    );
}

#[tokio::test]
async fn test_stream_without_final_keeps_partial_reply() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend {
        events: vec![
            StreamEvent::Chunk("partial answer".into()),
            StreamEvent::Disconnected("connection reset".into()),
        ],
        ..Default::default()
    };
    let controller = ChatController::mount(backend, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();

    let outcome = controller.send_message("hi").await.unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Replied { phase: ReplyPhase::Completed, .. }
    ));
    let reply = &controller.current_conversation().unwrap().messages[1];
    assert_eq!(reply.content, "partial answer");
}

#[tokio::test]
async fn test_stream_closing_before_any_text_is_streaming_error() {
    let temp = tempdir().unwrap();
    let controller = ChatController::mount(
        ScriptedBackend::default(),
        RecordingView::default(),
        LocalStore::new(temp.path()),
    )
    .await
    .unwrap();

    let outcome = controller.send_message("hi").await.unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Replied { phase: ReplyPhase::Error, .. }
    ));
    let reply = &controller.current_conversation().unwrap().messages[1];
    assert_eq!(reply.content, "**Streaming error.** Connection lost.");
    assert_eq!(reply.mizzi_status, Some(MizziStatus::Error));
}

#[tokio::test]
async fn test_blocked_mission_explains_only_failed_thresholds() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend {
        mission: Some(json!({
            "mission_id": "M-12",
            "status": "blocked",
            "guardian_approved": false,
            "confidence_score": 0.65,
            "trust_score": 0.60,
            "evidence_hash": "sha256:feed"
        })),
        ..Default::default()
    };
    let controller = ChatController::mount(backend, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();
    controller.set_mode(ChatMode::Mission).unwrap();

    let outcome = controller.send_message("Move the budget").await.unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Replied { phase: ReplyPhase::Blocked, .. }
    ));

    let stored = LocalStore::new(temp.path()).load_conversations().unwrap();
    let reply = &stored[0].messages[1];
    assert!(reply.content.contains("Confidence 65% is below the 70% threshold"));
    assert!(!reply.content.contains("Trust"));
    assert_eq!(reply.mizzi_status, Some(MizziStatus::Blocked));
    let evidence = reply.evidence_data.as_ref().unwrap();
    assert_eq!(evidence.evidence_hash.as_deref(), Some("sha256:feed"));
    assert_eq!(evidence.confidence_score, Some(0.65));
}

#[tokio::test]
async fn test_state_survives_remount() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend {
        events: vec![StreamEvent::Chunk("stored".into()), final_event()],
        ..Default::default()
    };
    let controller = ChatController::mount(backend, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();
    controller.select_model("gpt-4o").unwrap();
    controller.send_message("remember me").await.unwrap();
    controller.set_mode(ChatMode::Mission).unwrap();
    drop(controller);

    let remounted = ChatController::mount(
        ScriptedBackend::default(),
        RecordingView::default(),
        LocalStore::new(temp.path()),
    )
    .await
    .unwrap();

    assert_eq!(remounted.selected_model(), "gpt-4o");
    assert_eq!(remounted.mode(), ChatMode::Mission);
    let conversation = remounted.current_conversation().unwrap();
    assert_eq!(conversation.title, "remember me");
    assert_eq!(conversation.messages[1].content, "stored");
}

#[tokio::test]
async fn test_corrupt_store_mounts_fresh_conversation() {
    let temp = tempdir().unwrap();
    let store = LocalStore::new(temp.path());
    store.set(CONVERSATIONS_KEY, "[{\"id\": 42").unwrap();

    let controller = ChatController::mount(ScriptedBackend::default(), RecordingView::default(), store)
        .await
        .unwrap();

    let conversations = controller.conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "New Chat");
    assert_eq!(conversations[0].message_count, 0);
}

#[tokio::test]
async fn test_dispatch_routes_actions() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend {
        events: vec![StreamEvent::Chunk("pong".into()), final_event()],
        ..Default::default()
    };
    let controller = ChatController::mount(backend, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();

    let effect = dispatch(&controller, Action::from_input("/suggest 2").unwrap())
        .await
        .unwrap();
    assert_eq!(
        effect,
        ActionEffect::Prefill("Write a Python function to process user input".into())
    );

    let effect = dispatch(&controller, Action::from_input("ping").unwrap())
        .await
        .unwrap();
    assert!(matches!(effect, ActionEffect::Sent(SendOutcome::Replied { .. })));

    let effect = dispatch(&controller, Action::from_input("/mode mission").unwrap())
        .await
        .unwrap();
    assert_eq!(effect, ActionEffect::ModeChanged(ChatMode::Mission));

    let ActionEffect::ConversationOpened(new_id) =
        dispatch(&controller, Action::NewChat).await.unwrap()
    else {
        panic!("expected a new conversation");
    };
    let ActionEffect::Conversations(list) = dispatch(&controller, Action::List).await.unwrap() else {
        panic!("expected a conversation list");
    };
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, new_id);
    assert_eq!(list[1].title, "ping");

    let effect = dispatch(&controller, Action::from_input("/view-evidence M-4").unwrap())
        .await
        .unwrap();
    assert_eq!(
        effect,
        ActionEffect::Navigate(mz_chat::Route::Evidence("M-4".into()))
    );
}

// ---------------------------------------------------------------------------
// Against the real client and an in-process server
// ---------------------------------------------------------------------------

async fn chat_send(Json(body): Json<Value>) -> Json<Value> {
    let turns = body["messages"].as_array().map(|m| m.len()).unwrap_or(0);
    Json(json!({ "message_id": format!("msg-{}", turns) }))
}

async fn chat_stream(Query(params): Query<std::collections::HashMap<String, String>>) -> impl IntoResponse {
    let id = params.get("message_id").cloned().unwrap_or_default();
    let body = format!(
        concat!(
            "event: chunk\ndata: {{\"text\": \"Echo \"}}\n\n",
            "event: chunk\ndata: {{\"text\": \"{}\"}}\n\n",
            "event: final\ndata: {{\"mission_id\": \"M-1\"}}\n\n",
        ),
        id
    );
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

async fn models() -> Json<Value> {
    Json(json!({ "models": [{ "id": "gpt-4o", "name": "GPT-4o" }] }))
}

async fn spawn_server() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/api/chat/send", post(chat_send))
        .route("/api/chat/stream", get(chat_stream))
        .route("/api/chat/models", get(models));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fast_mode_over_http() {
    let url = spawn_server().await;
    let temp = tempdir().unwrap();
    let client = ApiClient::new(ApiConfig::new(&url));
    let controller = ChatController::mount(client, RecordingView::default(), LocalStore::new(temp.path()))
        .await
        .unwrap();

    assert_eq!(controller.selected_model(), "gpt-4o");
    controller.send_message("hello").await.unwrap();
    controller.send_message("again").await.unwrap();

    let stored = LocalStore::new(temp.path()).load_conversations().unwrap();
    let messages = &stored[0].messages;
    assert_eq!(messages.len(), 4);
    // history excludes the pending placeholder: 1 turn, then 3 turns
    assert_eq!(messages[1].content, "Echo msg-1");
    assert_eq!(messages[3].content, "Echo msg-3");
    assert_eq!(messages[3].mission_id.as_deref(), Some("M-1"));
    assert_eq!(messages[3].mizzi_status, Some(MizziStatus::Completed));
}
