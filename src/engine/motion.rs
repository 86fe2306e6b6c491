// src/engine/motion.rs
use crate::engine::grammar::Motion;
use crate::surface::TextSurface;

/// The extent an operator acts on. Linewise spans cover whole lines
/// including the trailing newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub linewise: bool,
}

/// Cursor destination for a bare motion, resolved against the surface's
/// current cursor.
pub fn destination(surface: &dyn TextSurface, motion: Motion, count: usize) -> usize {
    let snap = Snapshot::of(surface);
    let pos = surface.cursor_position();
    snap.destination(pos, motion, count)
}

/// Extent for operator+motion, anchored at the surface's current cursor.
pub fn span(surface: &dyn TextSurface, motion: Motion, count: usize) -> Span {
    let snap = Snapshot::of(surface);
    let pos = surface.cursor_position();

    match motion {
        Motion::CurrentLine => snap.line_span(snap.line_of(pos), snap.line_of(pos) + count - 1),
        // Vertical motions operate linewise, Vim style
        Motion::Up | Motion::Down | Motion::FirstLine | Motion::LastLine => {
            let dest = snap.destination(pos, motion, count);
            let (a, b) = (snap.line_of(pos), snap.line_of(dest));
            snap.line_span(a.min(b), a.max(b))
        }
        Motion::WordEnd => {
            // inclusive motion: the span covers the character landed on
            let dest = snap.destination(pos, motion, count);
            Span { start: pos.min(dest), end: (dest + 1).min(snap.len()), linewise: false }
        }
        _ => {
            let dest = snap.destination(pos, motion, count);
            Span { start: pos.min(dest), end: pos.max(dest), linewise: false }
        }
    }
}

// Char-offset snapshot of the surface text; all motion arithmetic happens
// here so the trait stays minimal.
struct Snapshot {
    chars: Vec<char>,
}

impl Snapshot {
    fn of(surface: &dyn TextSurface) -> Self {
        let text = surface.get_text_range(0, surface.length());
        Self { chars: text.chars().collect() }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn destination(&self, pos: usize, motion: Motion, count: usize) -> usize {
        let count = count.max(1);
        match motion {
            Motion::Left => pos.saturating_sub(count).max(self.line_start(pos)),
            Motion::Right => (pos + count).min(self.line_end(pos)),
            Motion::Up => self.vertical(pos, -(count as isize)),
            Motion::Down => self.vertical(pos, count as isize),
            Motion::WordForward => {
                (0..count).fold(pos, |p, _| self.next_word_start(p))
            }
            Motion::WordBack => (0..count).fold(pos, |p, _| self.prev_word_start(p)),
            Motion::WordEnd => (0..count).fold(pos, |p, _| self.word_end(p)),
            Motion::LineStart => self.line_start(pos),
            Motion::LineEnd => self.line_end(pos),
            Motion::FirstLine => 0,
            Motion::LastLine => self.line_start_of(self.last_line()),
            Motion::CurrentLine => pos,
        }
    }

    // Offset of the first character of the line containing pos
    fn line_start(&self, pos: usize) -> usize {
        let mut i = pos.min(self.len());
        while i > 0 && self.chars[i - 1] != '\n' {
            i -= 1;
        }
        i
    }

    // Offset of the newline terminating the line containing pos (or EOF)
    fn line_end(&self, pos: usize) -> usize {
        let mut i = pos.min(self.len());
        while i < self.len() && self.chars[i] != '\n' {
            i += 1;
        }
        i
    }

    fn line_of(&self, pos: usize) -> usize {
        self.chars[..pos.min(self.len())]
            .iter()
            .filter(|&&c| c == '\n')
            .count()
    }

    fn last_line(&self) -> usize {
        if self.len() == 0 {
            return 0;
        }
        self.line_of(self.len() - 1)
    }

    fn line_start_of(&self, line: usize) -> usize {
        let mut start = 0;
        for _ in 0..line {
            match self.chars[start..].iter().position(|&c| c == '\n') {
                Some(off) => start += off + 1,
                None => return start,
            }
        }
        start
    }

    fn vertical(&self, pos: usize, lines: isize) -> usize {
        let line = self.line_of(pos) as isize;
        let target = (line + lines).clamp(0, self.last_line() as isize) as usize;
        let col = pos - self.line_start(pos);
        let start = self.line_start_of(target);
        let end = self.line_end(start);
        (start + col).min(end)
    }

    fn line_span(&self, first: usize, last: usize) -> Span {
        let last = last.min(self.last_line());
        let start = self.line_start_of(first.min(last));
        let end_line_start = self.line_start_of(last);
        let end = self.line_end(end_line_start);
        // take the trailing newline with the lines
        let end = if end < self.len() { end + 1 } else { end };
        Span { start, end, linewise: true }
    }

    // Word scans cross line boundaries; whitespace delimits words.
    fn next_word_start(&self, pos: usize) -> usize {
        let mut i = pos;
        while i < self.len() && !self.chars[i].is_whitespace() {
            i += 1;
        }
        while i < self.len() && self.chars[i].is_whitespace() {
            i += 1;
        }
        i
    }

    fn prev_word_start(&self, pos: usize) -> usize {
        let mut i = pos;
        while i > 0 && self.chars[i - 1].is_whitespace() {
            i -= 1;
        }
        while i > 0 && !self.chars[i - 1].is_whitespace() {
            i -= 1;
        }
        i
    }

    fn word_end(&self, pos: usize) -> usize {
        if self.len() == 0 {
            return 0;
        }
        let mut i = (pos + 1).min(self.len() - 1);
        while i < self.len() && self.chars[i].is_whitespace() {
            i += 1;
        }
        if i >= self.len() {
            return self.len() - 1;
        }
        while i + 1 < self.len() && !self.chars[i + 1].is_whitespace() {
            i += 1;
        }
        i
    }
}
