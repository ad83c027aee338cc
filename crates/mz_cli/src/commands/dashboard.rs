//! Dashboard commands - Read-only views over missions and the QA agent.
//!
//! Feeds fall back to sample data when the backend is unavailable; the
//! output says so.

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use mz_api::{Dashboard, Feed, PipelineMission};

use crate::context::Context;

#[derive(Args)]
pub struct EvidenceArgs {
    /// Only show evidence for this mission
    mission_id: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

fn source_note<T>(feed: &Feed<T>) {
    if !feed.is_live() {
        println!("⚠️  Backend unavailable, showing sample data");
    }
}

pub async fn health(ctx: Context) -> Result<()> {
    info!("Checking backend health at {}", ctx.client.base_url());

    let report = ctx
        .client
        .health()
        .await
        .context("Health check failed")?;

    let status = if report.status.status.is_empty() {
        "unknown"
    } else {
        report.status.status.as_str()
    };
    let icon = if status == "healthy" || status == "ok" {
        "✅"
    } else {
        "⚠️"
    };
    println!("{} Backend: {}", icon, ctx.client.base_url());
    println!("   Status:  {}", status);
    if let Some(version) = &report.status.version {
        println!("   Version: {}", version);
    }
    println!("   Latency: {} ms", report.latency_ms);
    Ok(())
}

pub async fn history(ctx: Context) -> Result<()> {
    let feed = Dashboard::new(&ctx.client).mission_history().await;
    source_note(&feed);

    println!("📋 Mission history ({}):", feed.data.len());
    for mission in &feed.data {
        println!(
            "  {} {:<10} {:<10} {:<8} {}",
            status_icon(&mission.status),
            mission.id,
            mission.status,
            mission.mode,
            mission.summary
        );
        if !mission.timestamp.is_empty() || !mission.duration.is_empty() {
            println!("      {}  {}", mission.timestamp, mission.duration);
        }
    }
    Ok(())
}

pub async fn pipeline(ctx: Context) -> Result<()> {
    let feed = Dashboard::new(&ctx.client).pipeline().await;
    source_note(&feed);

    let board = &feed.data;
    let lanes: [(&str, &[PipelineMission]); 4] = [
        ("Queued", board.queued.as_slice()),
        ("Running", board.running.as_slice()),
        ("Completed", board.completed.as_slice()),
        ("Failed", board.failed.as_slice()),
    ];
    for (lane, missions) in lanes {
        println!("\n{} ({})", lane, missions.len());
        for mission in missions {
            print_pipeline_card(mission);
        }
    }
    Ok(())
}

fn print_pipeline_card(mission: &PipelineMission) {
    let attention = if mission.needs_human_input { " 🙋 needs input" } else { "" };
    println!(
        "  {} [{}] {:>3}% {}{}",
        mission.id,
        mission.mode,
        mission.progress,
        mission.summary,
        attention
    );
    if !mission.last_update.is_empty() {
        println!("      updated {}", mission.last_update);
    }
    if let Some(log) = mission.logs.last() {
        println!("      └ {}", log);
    }
}

pub async fn patterns(ctx: Context) -> Result<()> {
    let feed = Dashboard::new(&ctx.client).patterns().await;
    source_note(&feed);

    println!("🧠 Learned patterns ({}):", feed.data.len());
    for pattern in &feed.data {
        println!(
            "  {:<32} {:<14} used {:>4}×  success {:.0}%",
            pattern.name,
            pattern.category,
            pattern.usage_count,
            success_percent(pattern.success_rate)
        );
    }
    Ok(())
}

// Rates arrive either as a fraction or as a percentage.
fn success_percent(rate: f64) -> f64 {
    if rate <= 1.0 {
        rate * 100.0
    } else {
        rate
    }
}

pub async fn mizzi(ctx: Context) -> Result<()> {
    let dashboard = Dashboard::new(&ctx.client);
    let status = dashboard.mizzi_status().await;
    let events = dashboard.mizzi_events().await;
    source_note(&status);

    let s = &status.data;
    println!("{} Mizzi: {}", status_icon(&s.status), s.status);
    if !s.last_diagnostic.is_empty() {
        println!("   Last diagnostic:  {}", s.last_diagnostic);
    }
    println!("   Active tasks:     {}", s.active_tasks);
    println!("   Validations:      {}", s.total_validations);
    println!("   Rejected:         {}", s.rejected_missions);

    if !events.data.is_empty() {
        println!("\nRecent events:");
        for event in &events.data {
            println!("  {} {:<8} {}", event.timestamp, event.kind, event.message);
        }
    }
    Ok(())
}

pub async fn evidence(args: EvidenceArgs, ctx: Context) -> Result<()> {
    let feed = Dashboard::new(&ctx.client).evidence().await;
    let records: Vec<_> = feed
        .data
        .iter()
        .filter(|r| args.mission_id.as_deref().map_or(true, |id| r.mission_id == id))
        .collect();

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize evidence")?;
        println!("{}", json);
        return Ok(());
    }

    source_note(&feed);
    if records.is_empty() {
        match &args.mission_id {
            Some(id) => println!("No evidence recorded for mission {}", id),
            None => println!("No evidence recorded yet"),
        }
        return Ok(());
    }

    println!("🔒 Evidence ({}):", records.len());
    for record in records {
        println!("  {}  {}", record.mission_id, record.summary);
        println!("      hash: {}", record.evidence_hash);
        if !record.description.is_empty() {
            println!("      {}", record.description);
        }
        if !record.timestamp.is_empty() {
            println!("      {}", record.timestamp);
        }
    }
    Ok(())
}

fn status_icon(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "completed" | "passed" | "approved" | "active" | "healthy" => "✅",
        "failed" | "rejected" | "error" => "❌",
        "blocked" => "🛑",
        "running" | "queued" | "pending" => "⏳",
        _ => "•",
    }
}
