use ratatui::layout::Rect;
use samchat_core::{Provider, SessionState, TurnOrchestrator};
use tracing::debug;

/// Rows moved per mouse wheel notch
pub const WHEEL_SCROLL_ROWS: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Multi-line text being composed, with a cursor counted in characters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// Start of the cursor's line
    pub fn move_home(&mut self) {
        let (row, _) = self.cursor_position();
        self.cursor = self.line_start(row);
    }

    /// End of the cursor's line
    pub fn move_end(&mut self) {
        let (row, _) = self.cursor_position();
        let len = self.text.split('\n').nth(row).map_or(0, |l| l.chars().count());
        self.cursor = self.line_start(row) + len;
    }

    /// Hand back the text and leave the buffer empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Row and column of the cursor, both in characters
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = self.text.chars().take(self.cursor);
        let mut row = 0;
        let mut col = 0;
        for c in before {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    fn line_start(&self, row: usize) -> usize {
        self.text
            .split('\n')
            .take(row)
            .map(|line| line.chars().count() + 1)
            .sum()
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

pub struct App {
    pub should_quit: bool,
    pub session: TurnOrchestrator,
    pub input: InputBuffer,
    pub provider: Provider,
    pub model: String,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas from the last draw, for mouse hit-testing
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
    pub end_area: Option<Rect>,
}

impl App {
    pub fn new(session: TurnOrchestrator, provider: Provider, model: String) -> Self {
        Self {
            should_quit: false,
            session,
            input: InputBuffer::default(),
            provider,
            model,
            animation_frame: 0,
            chat_area: None,
            send_area: None,
            end_area: None,
        }
    }

    /// Send the composed message. Blank input stays in the box untouched.
    pub fn submit_input(&mut self) {
        if self.is_closing() || self.input.is_blank() {
            return;
        }
        let text = self.input.take();
        if let Some(sequence) = self.session.submit(&text) {
            debug!(sequence, "message submitted");
        }
    }

    pub fn end_chat(&mut self) {
        if self.session.end_chat().is_some() {
            self.input.take();
        }
    }

    pub fn is_closing(&self) -> bool {
        matches!(self.session.state(), SessionState::Closing { .. })
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.session.view_mut().scroll_up(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.session.view_mut().scroll_down(rows);
    }

    /// One screen of chat, keeping a row of overlap
    pub fn page_rows(&self) -> u16 {
        let (_, height) = self.session.view().viewport();
        height.saturating_sub(1).max(1)
    }
}
