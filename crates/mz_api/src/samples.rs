//! Sample dashboard data shown when the live API is unavailable.

use chrono::{Duration, Utc};

use crate::types::{
    EvidenceRecord, MissionSummary, MizziEvent, MizziStatus, Pattern, PipelineMission,
};

fn minutes_ago(minutes: i64) -> String {
    (Utc::now() - Duration::minutes(minutes)).to_rfc3339()
}

fn summary(id: &str, text: &str, status: &str, mode: &str, duration: &str, ago: i64) -> MissionSummary {
    MissionSummary {
        id: id.to_string(),
        summary: text.to_string(),
        status: status.to_string(),
        mode: mode.to_string(),
        duration: duration.to_string(),
        timestamp: minutes_ago(ago),
    }
}

pub fn mission_history() -> Vec<MissionSummary> {
    vec![
        summary("M-0003", "Generate market analysis report", "completed", "Enterprise", "15m 32s", 30),
        summary("M-0005", "Process bulk data transformation", "failed", "Fast", "5m 12s", 60),
        summary("M-0006", "Customer churn prediction analysis", "completed", "Standard", "8m 45s", 120),
        summary("M-0007", "Quarterly financial forecasting", "completed", "Enterprise", "22m 18s", 180),
        summary("M-0008", "Competitor pricing analysis", "completed", "Standard", "12m 05s", 240),
        summary("M-0009", "Email campaign effectiveness review", "failed", "Fast", "3m 22s", 300),
        summary("M-0010", "Product roadmap validation", "completed", "Standard", "18m 41s", 360),
    ]
}

#[allow(clippy::too_many_arguments)]
fn card(
    id: &str,
    text: &str,
    status: &str,
    mode: &str,
    submitted: i64,
    updated: i64,
    progress: u8,
    needs_human_input: bool,
    logs: &[&str],
) -> PipelineMission {
    PipelineMission {
        id: id.to_string(),
        summary: text.to_string(),
        status: status.to_string(),
        mode: mode.to_string(),
        submitted_at: minutes_ago(submitted),
        last_update: minutes_ago(updated),
        progress,
        needs_human_input,
        logs: logs.iter().map(|l| l.to_string()).collect(),
    }
}

pub fn pipeline_missions() -> Vec<PipelineMission> {
    vec![
        card(
            "M-0001",
            "Analyze quarterly revenue trends",
            "running",
            "Standard",
            5,
            1,
            65,
            false,
            &["Fetching data...", "Processing with AI agents...", "Generating insights..."],
        ),
        card("M-0002", "Review customer feedback sentiment", "queued", "Fast", 2, 2, 0, false, &[]),
        card(
            "M-0003",
            "Generate market analysis report",
            "completed",
            "Enterprise",
            30,
            10,
            100,
            false,
            &["Completed successfully"],
        ),
        card(
            "M-0004",
            "Validate compliance requirements",
            "running",
            "Standard",
            15,
            3,
            45,
            true,
            &["Awaiting human input for clarification..."],
        ),
        card(
            "M-0005",
            "Process bulk data transformation",
            "failed",
            "Fast",
            60,
            55,
            30,
            false,
            &["Error: Timeout exceeded", "Retry limit reached"],
        ),
    ]
}

fn pattern(name: &str, category: &str, usage_count: u64, success_rate: f64) -> Pattern {
    Pattern {
        name: name.to_string(),
        category: category.to_string(),
        usage_count,
        success_rate,
    }
}

pub fn patterns() -> Vec<Pattern> {
    vec![
        pattern("Market Analysis", "Business Intelligence", 142, 94.4),
        pattern("Financial Forecasting", "Finance", 87, 91.2),
        pattern("Customer Segmentation", "Marketing", 203, 96.8),
        pattern("Risk Assessment", "Compliance", 56, 89.3),
        pattern("Product Roadmap Planning", "Product", 34, 88.2),
        pattern("Competitor Analysis", "Business Intelligence", 119, 93.5),
        pattern("Sentiment Analysis", "Marketing", 267, 97.2),
        pattern("Data Quality Validation", "Data Engineering", 178, 92.1),
        pattern("Compliance Audit", "Compliance", 45, 86.7),
    ]
}

fn record(mission_id: &str, text: &str, hash: &str, ago: i64, description: &str) -> EvidenceRecord {
    EvidenceRecord {
        mission_id: mission_id.to_string(),
        summary: text.to_string(),
        evidence_hash: format!("sha256:{}", hash),
        timestamp: minutes_ago(ago),
        description: description.to_string(),
    }
}

pub fn evidence() -> Vec<EvidenceRecord> {
    const THREE_AGENTS: &str = "Consensus evidence from 3 AI agents";
    vec![
        record(
            "M-0003",
            "Generate market analysis report",
            "a3f8b92c1e4d5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a",
            30,
            THREE_AGENTS,
        ),
        record(
            "M-0006",
            "Customer churn prediction analysis",
            "b4c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5",
            120,
            THREE_AGENTS,
        ),
        record(
            "M-0007",
            "Quarterly financial forecasting",
            "c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6",
            180,
            "Enterprise mode - 5 agent consensus",
        ),
        record(
            "M-0008",
            "Competitor pricing analysis",
            "d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7",
            240,
            THREE_AGENTS,
        ),
        record(
            "M-0010",
            "Product roadmap validation",
            "e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8",
            360,
            THREE_AGENTS,
        ),
    ]
}

pub fn mizzi_status() -> MizziStatus {
    MizziStatus {
        status: "Monitoring".to_string(),
        last_diagnostic: minutes_ago(10),
        active_tasks: 2,
        total_validations: 1847,
        rejected_missions: 12,
    }
}

fn event(message: &str, kind: &str, ago: i64) -> MizziEvent {
    MizziEvent {
        message: message.to_string(),
        kind: kind.to_string(),
        timestamp: minutes_ago(ago),
    }
}

pub fn mizzi_events() -> Vec<MizziEvent> {
    vec![
        event("Validated mission M-0001", "success", 5),
        event("Rejected mission M-0002: missing required claims", "warning", 15),
        event("Consensus verification passed for M-0003", "success", 25),
        event("Pattern validation completed for Market Analysis", "info", 35),
        event("Diagnostic check completed - all systems nominal", "success", 45),
        event("Evidence hash verification completed for M-0006", "success", 55),
    ]
}
