//! Text buffer abstraction over the host's live editor.
//!
//! Positions follow the editor's addressing: zero-based line, zero-based
//! character column within the line.

use std::sync::{Mutex, MutexGuard};

/// A location in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub const fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    /// Position reached after writing `text` starting at `self`.
    pub fn advance(self, text: &str) -> Self {
        match text.rfind('\n') {
            Some(last_newline) => Self {
                line: self.line + text.matches('\n').count(),
                ch: text[last_newline + 1..].chars().count(),
            },
            None => Self {
                line: self.line,
                ch: self.ch + text.chars().count(),
            },
        }
    }
}

/// Byte offset of `pos` in `text`.
///
/// The column is clamped to the line's length and a line past the end maps to
/// the end of the text, the way editors clamp out-of-range positions.
pub fn offset_of(text: &str, pos: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..pos.line {
        match text[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return text.len(),
        }
    }

    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |i| line_start + i);
    let line = &text[line_start..line_end];

    line.char_indices()
        .nth(pos.ch)
        .map_or(line_end, |(i, _)| line_start + i)
}

/// Position of byte offset `offset` in `text`.
pub fn position_of(text: &str, offset: usize) -> Position {
    Position::default().advance(&text[..offset.min(text.len())])
}

/// The host's editing surface, as the upload engine needs it.
///
/// Implementations own their synchronisation; every method takes `&self`
/// because the buffer is shared with the live user session.
pub trait TextBuffer: Send + Sync {
    fn replace_range(&self, text: &str, from: Position, to: Position);

    /// Replaces the current selection (or inserts at the cursor) and moves the
    /// cursor after the inserted text.
    fn replace_selection(&self, text: &str);

    fn get_range(&self, from: Position, to: Position) -> String;

    /// Start of the first occurrence of `pattern`.
    fn find(&self, pattern: &str) -> Option<Position>;

    fn cursor(&self) -> Position;

    fn line(&self, line: usize) -> Option<String>;
}

/// In-memory [`TextBuffer`].
#[derive(Debug, Default)]
pub struct StringBuffer {
    state: Mutex<BufferState>,
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    anchor: Position,
    head: Position,
    revision: u64,
}

impl StringBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                text: text.into(),
                ..BufferState::default()
            }),
        }
    }

    /// Buffer with the cursor placed at the end of the text.
    pub fn with_cursor_at_end(text: impl Into<String>) -> Self {
        let buffer = Self::new(text);
        let end = position_of(&buffer.text(), usize::MAX);
        buffer.set_cursor(end);
        buffer
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().expect("lock poisoned")
    }

    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let mut state = self.state();
        state.text = text.into();
        state.revision += 1;
    }

    pub fn set_cursor(&self, pos: Position) {
        self.select(pos, pos);
    }

    pub fn select(&self, anchor: Position, head: Position) {
        let mut state = self.state();
        state.anchor = anchor;
        state.head = head;
    }

    /// Number of edits applied so far.
    pub fn revision(&self) -> u64 {
        self.state().revision
    }
}

impl BufferState {
    fn splice(&mut self, text: &str, from: Position, to: Position) {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let start = offset_of(&self.text, from);
        let end = offset_of(&self.text, to).max(start);
        self.text.replace_range(start..end, text);
        self.revision += 1;
    }
}

impl TextBuffer for StringBuffer {
    fn replace_range(&self, text: &str, from: Position, to: Position) {
        self.state().splice(text, from, to);
    }

    fn replace_selection(&self, text: &str) {
        let mut state = self.state();
        let (anchor, head) = (state.anchor, state.head);
        let from = anchor.min(head);
        state.splice(text, from, anchor.max(head));
        let cursor = position_of(&state.text, offset_of(&state.text, from) + text.len());
        state.anchor = cursor;
        state.head = cursor;
    }

    fn get_range(&self, from: Position, to: Position) -> String {
        let state = self.state();
        let start = offset_of(&state.text, from.min(to));
        let end = offset_of(&state.text, from.max(to)).max(start);
        state.text[start..end].to_owned()
    }

    fn find(&self, pattern: &str) -> Option<Position> {
        let state = self.state();
        state
            .text
            .find(pattern)
            .map(|offset| position_of(&state.text, offset))
    }

    fn cursor(&self) -> Position {
        self.state().head
    }

    fn line(&self, line: usize) -> Option<String> {
        self.state().text.split('\n').nth(line).map(str::to_owned)
    }
}
