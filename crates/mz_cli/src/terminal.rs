//! Incremental terminal output for the chat controller.
//!
//! The controller redraws whole conversations; a terminal can only append.
//! This sink remembers which conversation is on screen and how much of it
//! has been printed, and writes only what is new.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use mz_api::ModelOption;
use mz_chat::{
    render_content, render_empty_state, render_footer, render_header, render_message,
    Conversation, Message, ViewSink,
};

struct Screen<W> {
    out: W,
    conversation: Option<String>,
    printed: usize,
    streamed: usize,
}

pub struct TerminalView<W: Write + Send = io::Stdout> {
    screen: Mutex<Screen<W>>,
    show_status: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout(show_status: bool) -> Self {
        Self::with_writer(io::stdout(), show_status)
    }
}

impl<W: Write + Send> TerminalView<W> {
    /// `show_status` controls the Mizzi chip and evidence lines under replies.
    pub fn with_writer(out: W, show_status: bool) -> Self {
        Self {
            screen: Mutex::new(Screen {
                out,
                conversation: None,
                printed: 0,
                streamed: 0,
            }),
            show_status,
        }
    }

    pub fn into_writer(self) -> W {
        self.screen
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .out
    }

    fn message_text(&self, message: &Message, models: &[ModelOption]) -> String {
        if self.show_status {
            render_message(message, models)
        } else {
            format!(
                "{}\n{}",
                render_header(message, models),
                render_content(&message.content)
            )
        }
    }

    fn with_screen(&self, draw: impl FnOnce(&mut Screen<W>) -> io::Result<()>) {
        let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = draw(&mut *screen).and_then(|_| screen.out.flush()) {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }
}

impl<W: Write + Send> ViewSink for TerminalView<W> {
    fn render(&self, conversation: &Conversation, models: &[ModelOption]) {
        self.with_screen(|screen| {
            let switched = screen.conversation.as_deref() != Some(conversation.id.as_str())
                || conversation.messages.len() < screen.printed;
            if switched {
                writeln!(screen.out, "\n━━ {} ━━", conversation.title)?;
                if conversation.messages.is_empty() {
                    writeln!(screen.out, "{}", render_empty_state())?;
                }
                screen.conversation = Some(conversation.id.clone());
                screen.printed = 0;
                screen.streamed = 0;
            }

            for message in &conversation.messages[screen.printed..] {
                if message.is_pending() {
                    writeln!(screen.out, "\n{}", render_header(message, models))?;
                    writeln!(screen.out, "{}", message.content)?;
                } else {
                    writeln!(screen.out, "\n{}", self.message_text(message, models))?;
                }
            }
            screen.printed = conversation.messages.len();
            Ok(())
        });
    }

    fn patch_last_assistant(&self, content: &str) {
        self.with_screen(|screen| {
            match content.get(screen.streamed..) {
                Some(delta) => write!(screen.out, "{}", delta)?,
                None => write!(screen.out, "\n{}", content)?,
            }
            screen.streamed = content.len();
            Ok(())
        });
    }

    fn settle_last_assistant(&self, message: &Message, _models: &[ModelOption]) {
        self.with_screen(|screen| {
            if screen.streamed > 0 {
                writeln!(screen.out)?;
                if self.show_status {
                    if let Some(footer) = render_footer(message) {
                        writeln!(screen.out, "{}", footer)?;
                    }
                }
            } else {
                let mut body = render_content(&message.content);
                if self.show_status {
                    if let Some(footer) = render_footer(message) {
                        body.push('\n');
                        body.push_str(&footer);
                    }
                }
                writeln!(screen.out, "{}", body)?;
            }
            screen.streamed = 0;
            Ok(())
        });
    }
}
