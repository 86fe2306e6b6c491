// src/engine/pending.rs
use crossterm::event::KeyModifiers;

use crate::engine::grammar::{self, Parse, ParsedCommand};
use crate::engine::mode::Mode;

/// Default cap on an in-progress grammar sequence. Anything longer than this
/// cannot be heading toward a terminal rule and is discarded as unrecognized,
/// so the buffer can never grow without resolving.
pub const MAX_PENDING_KEYS: usize = 16;

/// Cap on an accumulated `:`/`/` line before it is discarded.
const MAX_LINE_KEYS: usize = 256;

/// Routing decision for one key: either the emulation layer owns it, or the
/// host's default key handling should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Consumed,
    PassThrough,
}

/// Accumulates raw key input into a pending command. One per bound session;
/// reset on every mode entry (except into Replacing) and after each dispatch.
#[derive(Debug)]
pub struct PendingCommand {
    raw: String,
    // Text typed during the current Insert session. Tracked for replay only,
    // never parsed as grammar.
    insert_capture: String,
    opened_in: Mode,
    max_keys: usize,
    state: Parse,
}

impl PendingCommand {
    pub fn new() -> Self {
        Self::with_max_keys(MAX_PENDING_KEYS)
    }

    pub fn with_max_keys(max_keys: usize) -> Self {
        Self {
            raw: String::new(),
            insert_capture: String::new(),
            opened_in: Mode::Normal,
            max_keys: max_keys.max(2),
            state: Parse::Pending,
        }
    }

    pub fn opened_in(&self) -> Mode {
        self.opened_in
    }

    /// The raw sequence so far; in Command/Search mode this is the line being
    /// typed, shown on the status line.
    pub fn line(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Feed one character. Insert-mode text is the host's to insert: it is
    /// captured for replay and passed through without touching the grammar
    /// state. Modified keys outside Insert mode belong to the host as well.
    pub fn append(&mut self, ch: char, modifiers: KeyModifiers) -> RouteDecision {
        let modified = modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match self.opened_in {
            Mode::Insert => {
                if !modified {
                    self.insert_capture.push(ch);
                }
                RouteDecision::PassThrough
            }
            Mode::Command | Mode::Search => {
                if self.raw.chars().count() >= MAX_LINE_KEYS {
                    self.state = Parse::Unrecognized;
                } else {
                    self.raw.push(ch);
                }
                RouteDecision::Consumed
            }
            Mode::Replacing => {
                self.raw.push(ch);
                // keep the preserved buffer bounded; only the newest key matters
                while self.raw.chars().count() > self.max_keys {
                    self.raw.remove(0);
                }
                self.state = grammar::parse(Mode::Replacing, &self.raw);
                RouteDecision::Consumed
            }
            Mode::Normal | Mode::Visual => {
                if modified {
                    return RouteDecision::PassThrough;
                }
                self.raw.push(ch);
                self.state = if self.raw.chars().count() > self.max_keys {
                    Parse::Unrecognized
                } else {
                    grammar::parse(self.opened_in, &self.raw)
                };
                RouteDecision::Consumed
            }
        }
    }

    /// Remove the last buffered key. Returns false when there was nothing to
    /// remove, meaning the host's own backspace handling should run. In
    /// Insert mode the capture shrinks but the host always handles the key.
    pub fn delete_last(&mut self) -> bool {
        if self.opened_in == Mode::Insert {
            self.insert_capture.pop();
            return false;
        }
        if self.raw.pop().is_none() {
            return false;
        }
        self.state = match self.opened_in {
            // already-replaced keys are not re-dispatched
            Mode::Replacing => Parse::Pending,
            _ => grammar::parse(self.opened_in, &self.raw),
        };
        true
    }

    /// True once the sequence resolves to one terminal action, including the
    /// unrecognized case the dispatcher discards.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, Parse::Complete(_) | Parse::Unrecognized)
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self.state, Parse::Unrecognized)
    }

    pub fn parsed(&self) -> Option<ParsedCommand> {
        match self.state {
            Parse::Complete(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Take the Insert-session capture, leaving it empty.
    pub fn take_capture(&mut self) -> String {
        std::mem::take(&mut self.insert_capture)
    }

    pub fn capture(&self) -> &str {
        &self.insert_capture
    }

    /// Record a key the host applied itself (Insert-mode Return).
    pub fn capture_push(&mut self, ch: char) {
        self.insert_capture.push(ch);
    }

    /// Clear all accumulated state and re-open under `mode`.
    pub fn reset(&mut self, mode: Mode) {
        self.raw.clear();
        self.insert_capture.clear();
        self.opened_in = mode;
        self.state = Parse::Pending;
    }

    /// Re-tag the buffer without clearing it: entering Replacing keeps the
    /// pending keys, which are command input there rather than document text.
    /// The completion state goes back to pending so the key that triggered
    /// the transition is not re-dispatched.
    pub fn retag(&mut self, mode: Mode) {
        self.opened_in = mode;
        self.state = Parse::Pending;
    }
}

impl Default for PendingCommand {
    fn default() -> Self {
        Self::new()
    }
}
