use tokio::task::JoinHandle;

use crate::render;
use crate::state::ChatMessage;
use crate::transport::{RagResponse, SentinelClient, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Opening message seeded into every conversation.
const WELCOME_MESSAGE: &str = "## Atlas AI Online\n\n\
I am connected to the **TaxIntegrity** secure evidence index.\n\n\
I can assist with:\n\
- Audit risk verification\n\
- Expense substantiation rules\n\
- Integrity protocol compliance\n\n\
How can I help you today?";

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub client: SentinelClient,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Conversation state (append-only, insertion-ordered)
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub last_retrieved: Option<u64>,
    pub send_task: Option<JoinHandle<Result<RagResponse, TransportError>>>,

    // Chat viewport state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: SentinelClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            client,
            input: String::new(),
            cursor: 0,
            messages: vec![ChatMessage::model(WELCOME_MESSAGE)],
            loading: false,
            last_retrieved: None,
            send_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
        }
    }

    /// A new send is accepted only while nothing is in flight and the trimmed
    /// input is non-empty. This is the entire concurrency guard: one request
    /// per conversation at a time.
    pub fn can_send(&self) -> bool {
        self.send_task.is_none() && !self.input.trim().is_empty()
    }

    /// Check whether the in-flight send has resolved and, if so, append the
    /// resulting chat message.
    pub async fn poll_send_task(&mut self) {
        let finished = self
            .send_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);

        if !finished {
            return;
        }

        if let Some(task) = self.send_task.take() {
            match task.await {
                Ok(result) => self.finish_send(result),
                // A panicked send task reaches the user through the same
                // error path as a failed request.
                Err(join_error) => {
                    self.loading = false;
                    self.messages.push(ChatMessage::error(format!(
                        "{}\n\n**Details:** {}",
                        render::APOLOGY_TEXT,
                        join_error
                    )));
                    self.scroll_chat_to_bottom();
                }
            }
        }
    }

    /// Resolve one chat turn: format a successful response, or map a
    /// transport failure to an in-conversation error message.
    pub fn finish_send(&mut self, result: Result<RagResponse, TransportError>) {
        match result {
            Ok(response) => {
                self.last_retrieved = Some(response.retrieved);
                self.messages
                    .push(ChatMessage::model(render::format_answer(&response)));
            }
            Err(error) => {
                self.messages.push(render::error_reply(&error));
            }
        }

        self.loading = false;
        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat so the latest message (or "Thinking...") is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "Sentinel:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.loading {
            total_lines += 2; // "Sentinel:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }
}
