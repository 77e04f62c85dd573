use chatbot_core::{ChatError, ChatSession, PendingReply, SessionState};

/// Lines used by the "AI:" / "Thinking..." rows while a reply is pending.
const BUSY_INDICATOR_LINES: u16 = 2;

pub struct App {
    pub should_quit: bool,

    // Conversation (transcript, input buffer, busy flag, last error)
    pub session: SessionState,
    chat: ChatSession,
    pub pending: Option<PendingReply>,
    pub model: String,

    // Input editing
    pub input_cursor: usize, // char index into session.pending_input

    // Chat scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render
    pub follow_tail: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(chat: ChatSession, model: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            session: SessionState::new(),
            chat,
            pending: None,
            model: model.into(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_tail: true,
            animation_frame: 0,
        }
    }

    /// Send whatever is in the input box. Ignored while a reply is pending.
    pub fn submit_input(&mut self) {
        if self.session.is_busy() {
            return;
        }

        let text = self.session.pending_input.clone();
        match self.chat.submit(&mut self.session, &text) {
            Ok(pending) => {
                self.pending = Some(pending);
                self.input_cursor = 0;
                self.animation_frame = 0;
                self.follow_tail = true;
                self.scroll_to_bottom();
            }
            Err(ChatError::EmptyInput) => {
                tracing::debug!("empty submit ignored");
            }
            Err(ChatError::Busy) => {}
        }
    }

    /// Settle the pending reply if its request has finished. Never waits on
    /// the network.
    pub async fn poll_pending(&mut self) {
        if !self.pending.as_ref().is_some_and(PendingReply::is_finished) {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.settle(&mut self.session).await;
            if self.follow_tail {
                self.scroll_to_bottom();
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Width the transcript is wrapped to. Falls back to 50 before the first draw.
    pub fn wrap_width(&self) -> usize {
        if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        }
    }

    /// Message text broken into display rows, exactly as the chat pane draws them.
    pub fn wrap_message(&self, text: &str) -> Vec<String> {
        let width = self.wrap_width();
        text.lines()
            .flat_map(|line| wrap_text_to_width(line, width))
            .collect()
    }

    /// Rendered line count of the transcript at the current chat width.
    pub fn transcript_lines(&self) -> u16 {
        let mut total_lines: u16 = 0;

        for msg in &self.session.transcript {
            let rows = self.wrap_message(&msg.text).len() as u16;
            // Role line, wrapped text, blank line after message
            total_lines = total_lines.saturating_add(rows.saturating_add(2));
        }

        if self.session.is_busy() {
            total_lines = total_lines.saturating_add(BUSY_INDICATOR_LINES);
        }

        total_lines
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.transcript_lines().saturating_sub(visible_height)
    }

    /// Scroll chat to bottom so the newest entry (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}

/// Wrap one line of text to `width` columns, breaking at the last space that
/// fits and splitting words longer than a row. Spacing inside a row is kept.
pub fn wrap_text_to_width(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if width == 0 || chars.len() <= width {
        return vec![line.to_string()];
    }

    let mut rows = Vec::new();
    let mut start = 0;

    while chars.len() - start > width {
        // The char just past the row may itself be the break point
        let window = &chars[start..=start + width];
        match window.iter().rposition(|c| *c == ' ') {
            Some(pos) if pos > 0 => {
                rows.push(window[..pos].iter().collect());
                start += pos + 1;
            }
            _ => {
                rows.push(window[..width].iter().collect());
                start += width;
            }
        }
    }

    rows.push(chars[start..].iter().collect());
    rows
}
