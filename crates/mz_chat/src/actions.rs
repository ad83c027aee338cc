//! Named user actions and their dispatch to the controller.
//!
//! Every interactive control maps to one [`Action`]. Text input starting
//! with `/` names an action; anything else is a message to send.

use std::path::PathBuf;

use crate::backend::ConsensusBackend;
use crate::controller::{ChatController, SendOutcome};
use crate::error::{ChatError, ChatResult};
use crate::types::{ChatMode, ConversationId, ConversationSummary, FileRef};
use crate::view::{ViewSink, SUGGESTIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Send(String),
    NewChat,
    SelectModel(String),
    SetMode(ChatMode),
    Attach(PathBuf),
    /// Zero-based position in the staged list
    RemoveFile(usize),
    Open(ConversationId),
    List,
    ViewMission(String),
    ViewEvidence(String),
    /// Zero-based index into [`SUGGESTIONS`]
    Suggest(usize),
}

/// Dashboard view an action asks the shell to switch to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Mission(String),
    Evidence(String),
}

/// What a dispatched action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    Sent(SendOutcome),
    ConversationOpened(ConversationId),
    Conversations(Vec<ConversationSummary>),
    ModelSelected(String),
    ModeChanged(ChatMode),
    FileAttached(FileRef),
    FileRemoved(FileRef),
    Navigate(Route),
    /// Text to place in the input box
    Prefill(String),
}

fn required<'a>(action: &str, arg: Option<&'a str>) -> ChatResult<&'a str> {
    arg.map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ChatError::InvalidAction {
            action: action.to_string(),
            reason: "missing argument".to_string(),
        })
}

// User-facing positions are 1-based.
fn position(action: &str, arg: Option<&str>) -> ChatResult<usize> {
    let raw = required(action, arg)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ChatError::InvalidAction {
            action: action.to_string(),
            reason: format!("expected a position starting at 1, got '{}'", raw),
        }),
    }
}

impl Action {
    /// Build an action from its name and optional argument.
    pub fn parse(name: &str, arg: Option<&str>) -> ChatResult<Self> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        let action = match name.as_str() {
            "send" => Self::Send(arg.unwrap_or_default().to_string()),
            "new" | "new-chat" => Self::NewChat,
            "model" | "select-model" => Self::SelectModel(required(&name, arg)?.to_string()),
            "mode" | "set-mode" => Self::SetMode(required(&name, arg)?.parse()?),
            "attach" => Self::Attach(PathBuf::from(required(&name, arg)?)),
            "remove" | "remove-file" => Self::RemoveFile(position(&name, arg)?),
            "open" => Self::Open(required(&name, arg)?.to_string()),
            "list" | "history" => Self::List,
            "view-mission" => Self::ViewMission(required(&name, arg)?.to_string()),
            "view-evidence" => Self::ViewEvidence(required(&name, arg)?.to_string()),
            "suggest" => {
                let index = position(&name, arg)?;
                if index >= SUGGESTIONS.len() {
                    return Err(ChatError::InvalidAction {
                        action: name.clone(),
                        reason: format!("there are {} suggestions", SUGGESTIONS.len()),
                    });
                }
                Self::Suggest(index)
            }
            _ => return Err(ChatError::UnknownAction(name.clone())),
        };
        Ok(action)
    }

    /// Interpret a line of input: `/name arg` is an action, other text is
    /// sent as a message.
    pub fn from_input(line: &str) -> ChatResult<Self> {
        let trimmed = line.trim();
        match trimmed.strip_prefix('/') {
            Some(command) => {
                let (name, arg) = match command.split_once(char::is_whitespace) {
                    Some((name, arg)) => (name, Some(arg)),
                    None => (command, None),
                };
                Self::parse(name, arg)
            }
            None => Ok(Self::Send(trimmed.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Send(_) => "send",
            Self::NewChat => "new-chat",
            Self::SelectModel(_) => "select-model",
            Self::SetMode(_) => "set-mode",
            Self::Attach(_) => "attach",
            Self::RemoveFile(_) => "remove-file",
            Self::Open(_) => "open",
            Self::List => "list",
            Self::ViewMission(_) => "view-mission",
            Self::ViewEvidence(_) => "view-evidence",
            Self::Suggest(_) => "suggest",
        }
    }
}

/// Run an action against the controller.
pub async fn dispatch<B, V>(
    controller: &ChatController<B, V>,
    action: Action,
) -> ChatResult<ActionEffect>
where
    B: ConsensusBackend,
    V: ViewSink,
{
    tracing::debug!(action = action.name(), "dispatching action");
    let effect = match action {
        Action::Send(text) => ActionEffect::Sent(controller.send_message(&text).await?),
        Action::NewChat => ActionEffect::ConversationOpened(controller.new_conversation()?),
        Action::SelectModel(model) => {
            controller.select_model(&model)?;
            ActionEffect::ModelSelected(model)
        }
        Action::SetMode(mode) => {
            controller.set_mode(mode)?;
            ActionEffect::ModeChanged(mode)
        }
        Action::Attach(path) => ActionEffect::FileAttached(controller.attach_file(path)?),
        Action::RemoveFile(index) => ActionEffect::FileRemoved(controller.remove_file(index)?),
        Action::Open(id) => {
            controller.open_conversation(&id)?;
            ActionEffect::ConversationOpened(id)
        }
        Action::List => ActionEffect::Conversations(controller.conversations()),
        Action::ViewMission(id) => ActionEffect::Navigate(Route::Mission(id)),
        Action::ViewEvidence(id) => ActionEffect::Navigate(Route::Evidence(id)),
        Action::Suggest(index) => {
            let (_, prompt) = SUGGESTIONS
                .get(index)
                .ok_or_else(|| ChatError::InvalidAction {
                    action: "suggest".to_string(),
                    reason: format!("no suggestion {}", index + 1),
                })?;
            ActionEffect::Prefill(prompt.to_string())
        }
    };
    Ok(effect)
}
