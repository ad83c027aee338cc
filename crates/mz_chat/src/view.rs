//! Text projection of conversations for terminal display.
//!
//! Rendering is pure: the same conversation always produces the same text,
//! apart from timestamps shown in local time.

use chrono::{DateTime, Local, Utc};
use mz_api::ModelOption;
use regex::Regex;

use crate::attachments::format_file_size;
use crate::types::{Conversation, Message, MizziStatus};

/// Prompts offered on an empty conversation, as `(label, prompt)`
pub const SUGGESTIONS: [(&str, &str); 3] = [
    ("Analyze data", "Analyze this CSV file for trends"),
    ("Write code", "Write a Python function to process user input"),
    ("Explain concepts", "Explain the DMCR routing algorithm"),
];

/// Receives controller output.
///
/// `render` redraws a whole conversation, `patch_last_assistant` replaces
/// the text of the reply being streamed, and `settle_last_assistant` is
/// called once when that reply reaches its final state.
pub trait ViewSink: Send + Sync {
    fn render(&self, conversation: &Conversation, models: &[ModelOption]);

    fn patch_last_assistant(&self, content: &str);

    fn settle_last_assistant(&self, message: &Message, models: &[ModelOption]);
}

/// Sink that discards all output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewSink for NullView {
    fn render(&self, _conversation: &Conversation, _models: &[ModelOption]) {}

    fn patch_last_assistant(&self, _content: &str) {}

    fn settle_last_assistant(&self, _message: &Message, _models: &[ModelOption]) {}
}

/// Icon and label of a status chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChip {
    pub icon: &'static str,
    pub label: &'static str,
}

pub fn status_chip(status: MizziStatus) -> StatusChip {
    let (icon, label) = match status {
        MizziStatus::Passed => ("✅", "Mizzi Validated"),
        MizziStatus::Completed => ("✅", "Completed"),
        MizziStatus::Failed => ("❌", "Mizzi Rejected"),
        MizziStatus::Pending => ("⏳", "Mizzi Pending"),
        MizziStatus::Error => ("⚠️", "Error"),
        MizziStatus::Blocked => ("🛑", "Blocked"),
    };
    StatusChip { icon, label }
}

/// Display name of a model id, falling back to the id itself
pub fn model_name<'a>(model_id: &'a str, models: &'a [ModelOption]) -> &'a str {
    models
        .iter()
        .find(|m| m.id == model_id)
        .map(|m| m.name.as_str())
        .unwrap_or(model_id)
}

pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

fn replace_all(text: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, replacement).into_owned(),
        Err(_) => text.to_string(),
    }
}

fn render_inline(text: &str) -> String {
    let text = replace_all(text, r"\*\*([^*]+)\*\*", "$1");
    let text = replace_all(&text, r"\*([^*\n]+)\*", "$1");
    replace_all(&text, r"\[([^\]]+)\]\(([^)]+)\)", "$1 <$2>")
}

fn render_code_block(language: &str, code: &str) -> String {
    let mut block = format!("┌─ {}\n", language);
    for line in code.trim().lines() {
        block.push_str("│ ");
        block.push_str(line);
        block.push('\n');
    }
    block.push_str("└─");
    block
}

/// Render markdown-ish message content as plain text.
///
/// Fenced code blocks get a language header and are left untouched inside;
/// emphasis markers are dropped and links become `text <url>`.
pub fn render_content(content: &str) -> String {
    let Ok(fence) = Regex::new(r"```(\w+)?\n([\s\S]*?)```") else {
        return render_inline(content);
    };

    let mut out = String::new();
    let mut last = 0;
    for caps in fence.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&render_inline(&content[last..whole.start()]));
        let language = caps.get(1).map(|m| m.as_str()).unwrap_or("plaintext");
        let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        out.push_str(&render_code_block(language, code));
        last = whole.end();
    }
    out.push_str(&render_inline(&content[last..]));
    out
}

/// Header line of a message: sender, model and time
pub fn render_header(message: &Message, models: &[ModelOption]) -> String {
    if message.is_user() {
        format!("👤 You · {}", format_time(message.timestamp))
    } else {
        match message.model.as_deref() {
            Some(model) => format!(
                "🤖 Missionize ({}) · {}",
                model_name(model, models),
                format_time(message.timestamp)
            ),
            None => format!("🤖 Missionize · {}", format_time(message.timestamp)),
        }
    }
}

/// Lines shown under an assistant reply: status chip, mission and evidence
pub fn render_footer(message: &Message) -> Option<String> {
    if message.is_user() {
        return None;
    }
    let status = message.mizzi_status?;
    let chip = status_chip(status);
    let mut footer = format!("[{} {}]", chip.icon, chip.label);

    if let Some(mission_id) = &message.mission_id {
        footer.push_str(&format!(" Mission: {}", mission_id));
        if let Some(files) = message.files_generated.filter(|n| *n > 0) {
            footer.push_str(&format!(" · {} files", files));
        }
        footer.push_str(&format!(
            "\n  /view-mission {} · /view-evidence {}",
            mission_id, mission_id
        ));
    }
    if let Some(hash) = message
        .evidence_data
        .as_ref()
        .and_then(|e| e.evidence_hash.as_deref())
    {
        footer.push_str(&format!("\n  🔒 Evidence: {}", hash));
    }
    Some(footer)
}

pub fn render_message(message: &Message, models: &[ModelOption]) -> String {
    let mut text = render_header(message, models);
    text.push('\n');
    text.push_str(&render_content(&message.content));

    if !message.files.is_empty() {
        let chips = message
            .files
            .iter()
            .map(|f| format!("📎 {} ({})", f.name, format_file_size(f.size)))
            .collect::<Vec<_>>()
            .join("  ");
        text.push('\n');
        text.push_str(&chips);
    }
    if let Some(footer) = render_footer(message) {
        text.push('\n');
        text.push_str(&footer);
    }
    text
}

/// Welcome text shown for a conversation without messages
pub fn render_empty_state() -> String {
    let mut text = String::from(
        "💬 Start a conversation\nAsk me anything - I can help with code, analysis, research, and more.\n",
    );
    for (i, (label, prompt)) in SUGGESTIONS.iter().enumerate() {
        text.push_str(&format!("\n  /suggest {}  {}: \"{}\"", i + 1, label, prompt));
    }
    text
}

pub fn render_conversation(conversation: &Conversation, models: &[ModelOption]) -> String {
    if conversation.messages.is_empty() {
        return render_empty_state();
    }
    conversation
        .messages
        .iter()
        .map(|m| render_message(m, models))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{fallback_models, FileRef};

    #[test]
    fn test_code_block_gets_language_header() {
        let text = render_content("Try this:\n```rust\nfn main() {}\n```\nDone **now**");
        assert_eq!(text, "Try this:\n┌─ rust\n│ fn main() {}\n└─\nDone now");
    }

    #[test]
    fn test_code_block_without_language() {
        let text = render_content("```\nplain *text*\n```");
        assert_eq!(text, "┌─ plaintext\n│ plain *text*\n└─");
    }

    #[test]
    fn test_inline_markdown() {
        assert_eq!(
            render_content("**Error:** see [docs](https://docs.missionize.ai) for *details*"),
            "Error: see docs <https://docs.missionize.ai> for details"
        );
        assert_eq!(render_content("use `cargo`"), "use `cargo`");
    }

    #[test]
    fn test_status_chips() {
        assert_eq!(status_chip(MizziStatus::Passed).label, "Mizzi Validated");
        assert_eq!(status_chip(MizziStatus::Failed).label, "Mizzi Rejected");
        assert_eq!(status_chip(MizziStatus::Pending).label, "Mizzi Pending");
    }

    #[test]
    fn test_assistant_message_uses_model_name() {
        let models = fallback_models();
        let mut msg = Message::assistant_placeholder("gpt-4o-mini", Utc::now());
        msg.content = "Hi".into();
        msg.mizzi_status = Some(MizziStatus::Passed);
        msg.mission_id = Some("M-3".into());
        msg.files_generated = Some(2);

        let text = render_message(&msg, &models);
        assert!(text.starts_with("🤖 Missionize (GPT-4o Mini) · "));
        assert!(text.contains("[✅ Mizzi Validated] Mission: M-3 · 2 files"));
        assert!(text.contains("/view-evidence M-3"));
    }

    #[test]
    fn test_unknown_model_shows_id() {
        assert_eq!(model_name("local-llm", &fallback_models()), "local-llm");
    }

    #[test]
    fn test_user_message_file_chips() {
        let msg = Message::user(
            "see attached",
            vec![FileRef {
                name: "data.csv".into(),
                size: 2048,
            }],
            Utc::now(),
        );
        let text = render_message(&msg, &[]);
        assert!(text.starts_with("👤 You · "));
        assert!(text.ends_with("📎 data.csv (2.0 KB)"));
        assert!(render_footer(&msg).is_none());
    }

    #[test]
    fn test_empty_conversation_shows_suggestions() {
        let conv = Conversation::new(Utc::now());
        let text = render_conversation(&conv, &[]);
        assert!(text.contains("Start a conversation"));
        assert!(text.contains("/suggest 3  Explain concepts"));
    }
}
