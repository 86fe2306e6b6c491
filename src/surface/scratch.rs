// src/surface/scratch.rs
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::mode::CaretStyle;
use super::TextSurface;

/// In-memory reference surface. The demo binary hosts the engine over one of
/// these; the test suite uses it to observe edits. Text is stored as a plain
/// string addressed by character offset.
#[derive(Debug)]
pub struct ScratchBuffer {
    text: String,
    cursor: usize,
    caret: CaretStyle,
    alive: bool,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            caret: CaretStyle::Bar,
            alive: true,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: 0,
            caret: CaretStyle::Bar,
            alive: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> CaretStyle {
        self.caret
    }

    /// Simulates the host closing the widget out from under the router.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_of(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.text.chars().nth(pos)
    }

    fn clamp(&self, pos: usize) -> usize {
        pos.min(self.char_count())
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl TextSurface for ScratchBuffer {
    fn length(&self) -> usize {
        self.char_count()
    }

    fn cursor_position(&self) -> usize {
        self.cursor
    }

    fn set_cursor_position(&mut self, pos: usize) {
        self.cursor = self.clamp(pos);
    }

    fn get_text_range(&self, start: usize, end: usize) -> String {
        let start = self.clamp(start);
        let end = self.clamp(end.max(start));
        let (b0, b1) = (self.byte_of(start), self.byte_of(end));
        self.text[b0..b1].to_string()
    }

    fn insert_text(&mut self, pos: usize, text: &str) {
        let pos = self.clamp(pos);
        let byte = self.byte_of(pos);
        self.text.insert_str(byte, text);
        if self.cursor >= pos {
            self.cursor += text.chars().count();
        }
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        let start = self.clamp(start);
        let end = self.clamp(end.max(start));
        let (b0, b1) = (self.byte_of(start), self.byte_of(end));
        self.text.replace_range(b0..b1, "");
        if self.cursor >= end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
    }

    fn set_caret_style(&mut self, style: CaretStyle) {
        self.caret = style;
    }

    fn word_bounds_at(&self, pos: usize) -> (usize, usize) {
        let pos = self.clamp(pos);
        if !self.char_at(pos).map(is_word_char).unwrap_or(false) {
            return (pos, pos);
        }
        let mut start = pos;
        while start > 0 && self.char_at(start - 1).map(is_word_char).unwrap_or(false) {
            start -= 1;
        }
        let mut end = pos;
        while self.char_at(end).map(is_word_char).unwrap_or(false) {
            end += 1;
        }
        (start, end)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Cloneable handle to a shared scratch buffer, so the host can keep reading
/// the surface it handed to the router. This is the typed stand-in for the
/// widget pointer a real host would hold.
#[derive(Debug, Clone)]
pub struct ScratchHandle(Rc<RefCell<ScratchBuffer>>);

impl ScratchHandle {
    pub fn new(buffer: ScratchBuffer) -> Self {
        Self(Rc::new(RefCell::new(buffer)))
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(ScratchBuffer::from_text(text))
    }

    pub fn text(&self) -> String {
        self.0.borrow().text().to_string()
    }

    pub fn caret(&self) -> CaretStyle {
        self.0.borrow().caret()
    }

    pub fn kill(&self) {
        self.0.borrow_mut().kill();
    }
}

impl TextSurface for ScratchHandle {
    fn length(&self) -> usize {
        self.0.borrow().length()
    }

    fn cursor_position(&self) -> usize {
        self.0.borrow().cursor_position()
    }

    fn set_cursor_position(&mut self, pos: usize) {
        self.0.borrow_mut().set_cursor_position(pos);
    }

    fn get_text_range(&self, start: usize, end: usize) -> String {
        self.0.borrow().get_text_range(start, end)
    }

    fn insert_text(&mut self, pos: usize, text: &str) {
        self.0.borrow_mut().insert_text(pos, text);
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        self.0.borrow_mut().delete_range(start, end);
    }

    fn set_caret_style(&mut self, style: CaretStyle) {
        self.0.borrow_mut().set_caret_style(style);
    }

    fn word_bounds_at(&self, pos: usize) -> (usize, usize) {
        self.0.borrow().word_bounds_at(pos)
    }

    fn is_alive(&self) -> bool {
        self.0.borrow().is_alive()
    }
}
