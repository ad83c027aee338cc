//! Wire types exchanged with the consensus API.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Consensus agents reported in a mission envelope.
pub const CONSENSUS_AGENTS: [&str; 5] = [
    "proposer",
    "challenger",
    "arbiter",
    "devils_advocate",
    "guardian_angel",
];

/// One turn of conversation history sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSendRequest {
    pub messages: Vec<ChatTurn>,
    pub model_id: String,
    pub conversation_id: String,
}

/// Reply of `POST /api/chat/send`.
///
/// Either carries the completion directly or a `message_id` to stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mizzi_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_generated: Option<u32>,
}

impl ChatSendResponse {
    /// Message id to subscribe to, if the backend offered a stream.
    ///
    /// Falls back to the `message_id` query parameter of `stream_url`.
    pub fn stream_message_id(&self) -> Option<String> {
        if let Some(id) = self.message_id.as_ref().filter(|id| !id.is_empty()) {
            return Some(id.clone());
        }
        let url = self.stream_url.as_ref()?;
        let query = url.split_once('?')?.1;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "message_id")
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    /// Completion text of a non-streamed reply.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()))
    }
}

/// A selectable completion model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ModelOption {
    pub fn new(id: &str, name: &str, provider: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider: Some(provider.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelOption>,
}

/// File forwarded to a mission run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFilePayload {
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub mime: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionContext {
    pub conversation_history: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached_files: Vec<AttachedFilePayload>,
}

/// Body of `POST /run-custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionRequest {
    pub task: String,
    pub context: MissionContext,
    pub execution_mode: String,
    pub require_consensus: bool,
    pub enable_pattern_learning: bool,
}

impl MissionRequest {
    /// Build a consensus request from a task, its history and attachments.
    ///
    /// Attachment names are appended to the task so the agents see them.
    pub fn new(
        task: &str,
        history: Vec<ChatTurn>,
        attached_files: Vec<AttachedFilePayload>,
    ) -> Self {
        let task = if attached_files.is_empty() {
            task.to_string()
        } else {
            let names = attached_files
                .iter()
                .map(|f| format!("[Attached: {}]", f.name))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}\n\n{}", task, names)
        };

        Self {
            task,
            context: MissionContext {
                conversation_history: history,
                attached_files,
            },
            execution_mode: "fast".to_string(),
            require_consensus: true,
            enable_pattern_learning: true,
        }
    }
}

/// Longest agent verdict shown in a consensus summary, in characters
pub const VERDICT_MAX_CHARS: usize = 100;

/// A single agent's verdict inside an evidence envelope.
///
/// Agents answer in several shapes: a bare string, an object whose text
/// lives under `recommendation`, `critique`, `final_decision` or
/// `decision`, or something else entirely. Decoding never fails; fields
/// that cannot be read are left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct AgentDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objections: Vec<String>,
    /// Objections reported only as a number
    #[serde(default, skip_serializing_if = "is_zero")]
    pub objection_count: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl AgentDecision {
    pub fn is_high_risk(&self) -> bool {
        self.risk_level
            .as_deref()
            .map(|r| r.trim().eq_ignore_ascii_case("high"))
            .unwrap_or(false)
    }

    /// Number of objections, whether listed or only counted
    pub fn objection_total(&self) -> u64 {
        self.objection_count.max(self.objections.len() as u64)
    }

    /// The agent's text for display, truncated to [`VERDICT_MAX_CHARS`].
    pub fn verdict(&self) -> Option<String> {
        let text = [
            &self.recommendation,
            &self.critique,
            &self.final_decision,
            &self.decision,
        ]
        .into_iter()
        .flatten()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())?;

        if text.chars().count() > VERDICT_MAX_CHARS {
            let cut: String = text.chars().take(VERDICT_MAX_CHARS).collect();
            Some(format!("{}...", cut))
        } else {
            Some(text.to_string())
        }
    }
}

fn text_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_of(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

// Objection entries may be strings or objects carrying their text.
fn objection_text(value: &serde_json::Value) -> Option<String> {
    if let serde_json::Value::Object(map) = value {
        return ["text", "objection", "message", "description", "reason"]
            .iter()
            .find_map(|k| map.get(*k).and_then(text_of))
            .or_else(|| Some(value.to_string()));
    }
    text_of(value)
}

fn objections_of(value: Option<&serde_json::Value>) -> (Vec<String>, u64) {
    match value {
        Some(serde_json::Value::Array(items)) => (
            items
                .iter()
                .filter_map(objection_text)
                .filter(|o| !o.trim().is_empty())
                .collect(),
            0,
        ),
        Some(serde_json::Value::Number(n)) => {
            let count = n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
                .unwrap_or(0);
            (Vec::new(), count)
        }
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => (vec![s.clone()], 0),
        Some(serde_json::Value::Object(_)) => {
            (value.and_then(objection_text).into_iter().collect(), 0)
        }
        _ => (Vec::new(), 0),
    }
}

impl From<serde_json::Value> for AgentDecision {
    fn from(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = value else {
            return Self {
                decision: text_of(&value),
                ..Self::default()
            };
        };
        let field = |key: &str| map.get(key).and_then(text_of);
        let (objections, listed_count) = objections_of(map.get("objections"));
        let objection_count = map
            .get("objection_count")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(listed_count);

        Self {
            recommendation: field("recommendation"),
            critique: field("critique"),
            final_decision: field("final_decision"),
            decision: field("decision"),
            reasoning: field("reasoning"),
            confidence: map.get("confidence").and_then(number_of),
            risk_level: field("risk_level").or_else(|| field("risk")),
            objections,
            objection_count,
        }
    }
}

/// Evidence envelope returned by a mission run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_approved: Option<bool>,
    #[serde(default, deserialize_with = "decisions_or_empty")]
    pub agent_decisions: BTreeMap<String, AgentDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

fn decisions_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, AgentDecision>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(agent, value)| (agent, AgentDecision::from(value)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

impl MissionResponse {
    pub fn decision(&self, agent: &str) -> Option<&AgentDecision> {
        self.agent_decisions.get(agent)
    }

    /// Readable outcome text: the recommendation, else a textual result.
    pub fn outcome_text(&self) -> Option<String> {
        if let Some(rec) = self.final_recommendation.as_ref().filter(|r| !r.is_empty()) {
            return Some(rec.clone());
        }
        match self.result.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Entry of `GET /missions/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSummary {
    pub id: String,
    pub summary: String,
    pub status: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Card on the mission pipeline board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMission {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default, alias = "submittedAt")]
    pub submitted_at: String,
    #[serde(default, alias = "lastUpdate")]
    pub last_update: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, alias = "needsHumanInput")]
    pub needs_human_input: bool,
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Reply of `GET /missions/pipeline`, grouped by lane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineBoard {
    #[serde(default)]
    pub queued: Vec<PipelineMission>,
    #[serde(default)]
    pub running: Vec<PipelineMission>,
    #[serde(default)]
    pub completed: Vec<PipelineMission>,
    #[serde(default)]
    pub failed: Vec<PipelineMission>,
}

impl PipelineBoard {
    /// Flatten the lanes, stamping each card with its lane as status.
    pub fn missions(&self) -> Vec<PipelineMission> {
        let lanes = [
            ("queued", &self.queued),
            ("running", &self.running),
            ("completed", &self.completed),
            ("failed", &self.failed),
        ];
        lanes
            .into_iter()
            .flat_map(|(lane, missions)| {
                missions.iter().cloned().map(move |mut m| {
                    m.status = lane.to_string();
                    m
                })
            })
            .collect()
    }

    /// Regroup a flat list of cards by their status.
    pub fn from_missions(missions: Vec<PipelineMission>) -> Self {
        let mut board = Self::default();
        for mission in missions {
            match mission.status.as_str() {
                "queued" => board.queued.push(mission),
                "running" => board.running.push(mission),
                "completed" => board.completed.push(mission),
                _ => board.failed.push(mission),
            }
        }
        board
    }
}

/// Entry of the pattern registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "usageCount")]
    pub usage_count: u64,
    #[serde(default, alias = "successRate")]
    pub success_rate: f64,
}

/// Mizzi QA agent status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MizziStatus {
    pub status: String,
    #[serde(default, alias = "lastDiagnostic")]
    pub last_diagnostic: String,
    #[serde(default, alias = "activeTasks")]
    pub active_tasks: u32,
    #[serde(default, alias = "totalValidations")]
    pub total_validations: u64,
    #[serde(default, alias = "rejectedMissions")]
    pub rejected_missions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MizziEvent {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Evidence record of a finished mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    #[serde(alias = "missionId")]
    pub mission_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(alias = "evidenceHash")]
    pub evidence_hash: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub description: String,
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Health check outcome with measured latency.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub latency_ms: u128,
}

/// API key as listed by `GET /user/api-keys` (secret never included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeySummary {
    pub key_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub key_prefix: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysResponse {
    #[serde(default)]
    pub keys: Vec<ApiKeySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// Reply of `POST /user/api-keys`; the only time the full key is visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub key: String,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// Reply of `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_prefers_message_id() {
        let reply = ChatSendResponse {
            message_id: Some("msg-1".into()),
            stream_url: Some("/api/chat/stream?message_id=other".into()),
            ..Default::default()
        };
        assert_eq!(reply.stream_message_id().as_deref(), Some("msg-1"));
    }

    #[test]
    fn test_stream_id_from_stream_url() {
        let reply = ChatSendResponse {
            stream_url: Some("/api/chat/stream?token=x&message_id=msg-9".into()),
            ..Default::default()
        };
        assert_eq!(reply.stream_message_id().as_deref(), Some("msg-9"));
    }

    #[test]
    fn test_immediate_reply_text() {
        let reply: ChatSendResponse =
            serde_json::from_str(r#"{"message": "hello", "mizzi_status": "passed"}"#).unwrap();
        assert!(reply.stream_message_id().is_none());
        assert_eq!(reply.text(), Some("hello"));
    }

    #[test]
    fn test_mission_request_lists_attachments() {
        let files = vec![AttachedFilePayload {
            name: "data.csv".into(),
            content: "a,b".into(),
            mime: "text/csv".into(),
        }];
        let request = MissionRequest::new("Analyze", vec![ChatTurn::new("user", "Analyze")], files);
        assert_eq!(request.task, "Analyze\n\n[Attached: data.csv]");
        assert_eq!(request.execution_mode, "fast");
        assert!(request.require_consensus);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["context"]["attached_files"][0]["type"], "text/csv");
    }

    #[test]
    fn test_mission_request_without_attachments_omits_field() {
        let request = MissionRequest::new("Plan", Vec::new(), Vec::new());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["context"].get("attached_files").is_none());
    }

    #[test]
    fn test_agent_decision_shapes() {
        let envelope: MissionResponse = serde_json::from_str(
            r#"{
                "status": "blocked",
                "agent_decisions": {
                    "proposer": "approve",
                    "challenger": {"decision": "reject", "objections": ["weak sources", "scope"]},
                    "arbiter": {"decision": "hold", "risk": "HIGH"},
                    "devils_advocate": {"objections": 2},
                    "guardian_angel": {"decision": "block", "objections": ""}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            envelope.decision("proposer").unwrap().decision.as_deref(),
            Some("approve")
        );
        assert_eq!(envelope.decision("challenger").unwrap().objections.len(), 2);
        assert!(envelope.decision("arbiter").unwrap().is_high_risk());
        let devil = envelope.decision("devils_advocate").unwrap();
        assert!(devil.objections.is_empty());
        assert_eq!(devil.objection_total(), 2);
        assert!(envelope.decision("guardian_angel").unwrap().objections.is_empty());
    }

    #[test]
    fn test_verdict_prefers_recommendation_then_critique() {
        let envelope: MissionResponse = serde_json::from_value(serde_json::json!({
            "status": "completed",
            "agent_decisions": {
                "proposer": {"recommendation": "Use Postgres", "decision": "approve"},
                "challenger": {"critique": "Consider SQLite"},
                "arbiter": {"final_decision": "Approve Postgres"},
                "guardian_angel": {"decision": "approve"},
                "devils_advocate": {"reasoning": "only reasons"}
            }
        }))
        .unwrap();

        let verdict = |agent: &str| envelope.decision(agent).unwrap().verdict();
        assert_eq!(verdict("proposer").as_deref(), Some("Use Postgres"));
        assert_eq!(verdict("challenger").as_deref(), Some("Consider SQLite"));
        assert_eq!(verdict("arbiter").as_deref(), Some("Approve Postgres"));
        assert_eq!(verdict("guardian_angel").as_deref(), Some("approve"));
        assert_eq!(verdict("devils_advocate"), None);
    }

    #[test]
    fn test_long_verdict_is_truncated() {
        let decision = AgentDecision {
            recommendation: Some("x".repeat(150)),
            ..Default::default()
        };
        let verdict = decision.verdict().unwrap();
        assert_eq!(verdict.chars().count(), VERDICT_MAX_CHARS + 3);
        assert!(verdict.ends_with("..."));
    }

    #[test]
    fn test_odd_decision_shapes_still_decode() {
        let envelope: MissionResponse = serde_json::from_value(serde_json::json!({
            "status": "blocked",
            "guardian_approved": false,
            "evidence_hash": "sha256:keep",
            "agent_decisions": {
                "challenger": {"decision": "object", "objections": [{"text": "no source"}, "vague"]},
                "proposer": {"decision": 42, "confidence": "0.8"},
                "arbiter": {"objections": -3, "risk_level": "HIGH"},
                "guardian_angel": ["unexpected", "list"],
                "devils_advocate": null
            }
        }))
        .unwrap();

        assert_eq!(envelope.evidence_hash.as_deref(), Some("sha256:keep"));
        let challenger = envelope.decision("challenger").unwrap();
        assert_eq!(challenger.objections, vec!["no source", "vague"]);
        let proposer = envelope.decision("proposer").unwrap();
        assert_eq!(proposer.decision.as_deref(), Some("42"));
        assert_eq!(proposer.confidence, Some(0.8));
        let arbiter = envelope.decision("arbiter").unwrap();
        assert_eq!(arbiter.objection_total(), 0);
        assert!(arbiter.is_high_risk());
        assert_eq!(envelope.decision("guardian_angel").unwrap(), &AgentDecision::default());
    }

    #[test]
    fn test_huge_objection_count_is_not_expanded() {
        let decision: AgentDecision =
            serde_json::from_value(serde_json::json!({"objections": 4_000_000_000u64})).unwrap();
        assert!(decision.objections.is_empty());
        assert_eq!(decision.objection_total(), 4_000_000_000);
    }

    #[test]
    fn test_decision_survives_storage_round_trip() {
        let decision = AgentDecision {
            critique: Some("Consider SQLite".into()),
            objection_count: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&decision).unwrap();
        let back: AgentDecision = serde_json::from_value(json).unwrap();
        assert_eq!(back, decision);
    }

    #[test]
    fn test_non_map_decisions_are_ignored() {
        let envelope: MissionResponse =
            serde_json::from_str(r#"{"status": "completed", "agent_decisions": null}"#).unwrap();
        assert!(envelope.agent_decisions.is_empty());
    }

    #[test]
    fn test_outcome_text() {
        let mut envelope = MissionResponse {
            result: Some(serde_json::json!("done")),
            ..Default::default()
        };
        assert_eq!(envelope.outcome_text().as_deref(), Some("done"));

        envelope.final_recommendation = Some("Ship it".into());
        assert_eq!(envelope.outcome_text().as_deref(), Some("Ship it"));
    }

    #[test]
    fn test_pipeline_board_flatten_and_regroup() {
        let board: PipelineBoard = serde_json::from_str(
            r#"{
                "queued": [{"id": "M-1", "summary": "a", "submitted_at": "t", "needs_human_input": true}],
                "running": [{"id": "M-2", "summary": "b", "progress": 40}],
                "completed": [],
                "failed": [{"id": "M-3", "summary": "c"}]
            }"#,
        )
        .unwrap();

        let missions = board.missions();
        assert_eq!(missions.len(), 3);
        assert_eq!(missions[0].status, "queued");
        assert!(missions[0].needs_human_input);
        assert_eq!(missions[2].status, "failed");

        let regrouped = PipelineBoard::from_missions(missions);
        assert_eq!(regrouped.running.len(), 1);
        assert_eq!(regrouped.running[0].progress, 40);
    }
}
