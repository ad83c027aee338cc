//! Turning consensus envelopes into reply text.
//!
//! A mission is blocked when the guardian withholds approval or the
//! envelope says so. The explanation lists every threshold the mission
//! missed, checked in a fixed order.

use std::fmt::Write;

use mz_api::{MissionResponse, CONSENSUS_AGENTS};

/// Minimum confidence score for approval
pub const CONFIDENCE_THRESHOLD: f64 = 0.70;

/// Minimum trust score for approval
pub const TRUST_THRESHOLD: f64 = 0.60;

/// One reason a mission failed its quality gate
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    LowConfidence(f64),
    LowTrust(f64),
    HighArbiterRisk,
    /// Objection total and whichever objections were spelled out
    ChallengerObjections { count: u64, listed: Vec<String> },
    /// Blocked without any specific threshold being missed
    ThresholdsNotMet,
}

impl BlockReason {
    pub fn describe(&self) -> String {
        match self {
            Self::LowConfidence(score) => format!(
                "Confidence {} is below the {} threshold",
                percent(*score),
                percent(CONFIDENCE_THRESHOLD)
            ),
            Self::LowTrust(score) => format!(
                "Trust {} is below the {} threshold",
                percent(*score),
                percent(TRUST_THRESHOLD)
            ),
            Self::HighArbiterRisk => "Arbiter assessed the risk as HIGH".to_string(),
            Self::ChallengerObjections { count, listed } => {
                let mut text = format!("Challenger raised {} objection(s)", count);
                if !listed.is_empty() {
                    let _ = write!(text, ": {}", listed.join("; "));
                }
                text
            }
            Self::ThresholdsNotMet => "Consensus quality thresholds were not met".to_string(),
        }
    }
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

pub fn is_blocked(envelope: &MissionResponse) -> bool {
    envelope.guardian_approved == Some(false) || envelope.status.eq_ignore_ascii_case("blocked")
}

/// Why a blocked mission was rejected, in display order
pub fn block_reasons(envelope: &MissionResponse) -> Vec<BlockReason> {
    let mut reasons = Vec::new();

    if let Some(confidence) = envelope.confidence_score {
        if confidence < CONFIDENCE_THRESHOLD {
            reasons.push(BlockReason::LowConfidence(confidence));
        }
    }
    if let Some(trust) = envelope.trust_score {
        if trust < TRUST_THRESHOLD {
            reasons.push(BlockReason::LowTrust(trust));
        }
    }
    if envelope
        .decision("arbiter")
        .map(|d| d.is_high_risk())
        .unwrap_or(false)
    {
        reasons.push(BlockReason::HighArbiterRisk);
    }
    if let Some(challenger) = envelope.decision("challenger") {
        let count = challenger.objection_total();
        if count > 0 {
            reasons.push(BlockReason::ChallengerObjections {
                count,
                listed: challenger.objections.clone(),
            });
        }
    }

    if reasons.is_empty() {
        reasons.push(BlockReason::ThresholdsNotMet);
    }
    reasons
}

/// Reply text for a blocked mission.
pub fn explain_block(envelope: &MissionResponse) -> String {
    let mut text = String::from(
        "**Mission blocked by Guardian**\n\nThis request did not pass consensus review:\n",
    );
    for reason in block_reasons(envelope) {
        let _ = write!(text, "\n• {}", reason.describe());
    }
    text.push_str("\n\n");
    push_footer(&mut text, envelope);
    text.push_str("\nTry rephrasing with more context, or switch to Fast mode.");
    text
}

/// Reply text for an approved mission: the outcome followed by the
/// consensus summary.
pub fn summarize_approved(envelope: &MissionResponse) -> String {
    let mut text = envelope
        .outcome_text()
        .unwrap_or_else(|| "Consensus reached.".to_string());

    text.push_str("\n\n---\n**Consensus:** ");
    text.push_str(&envelope.status);
    if let Some(confidence) = envelope.confidence_score {
        let _ = write!(text, " · confidence {}", percent(confidence));
    }
    if let Some(trust) = envelope.trust_score {
        let _ = write!(text, " · trust {}", percent(trust));
    }

    for (agent, decision) in ordered_decisions(envelope) {
        let verdict = decision.verdict().unwrap_or_else(|| "no verdict".to_string());
        let _ = write!(text, "\n• {}: {}", agent, verdict);
    }
    text.push_str("\n\n");
    push_footer(&mut text, envelope);
    text
}

fn push_footer(text: &mut String, envelope: &MissionResponse) {
    let mission = envelope.mission_id.as_deref().unwrap_or("unknown");
    let _ = write!(text, "Mission: {}", mission);
    if let Some(hash) = &envelope.evidence_hash {
        let _ = write!(text, " · Evidence: {}", hash);
    }
}

// Known agents in pipeline order, then anything else the backend sent.
fn ordered_decisions(
    envelope: &MissionResponse,
) -> Vec<(&str, &mz_api::AgentDecision)> {
    let mut ordered: Vec<_> = CONSENSUS_AGENTS
        .iter()
        .filter_map(|agent| envelope.decision(agent).map(|d| (*agent, d)))
        .collect();
    ordered.extend(
        envelope
            .agent_decisions
            .iter()
            .filter(|(agent, _)| !CONSENSUS_AGENTS.contains(&agent.as_str()))
            .map(|(agent, d)| (agent.as_str(), d)),
    );
    ordered
}
