// src/engine/mod.rs
pub mod dispatch;
pub mod grammar;
pub mod mode;
pub mod motion;
pub mod pending;
pub mod register;
pub mod repeat;

// Re-export the types we need publicly
pub use dispatch::{DispatchResult, EditAction, LifecycleAction};
pub use grammar::{CommandKind, InsertEntry, Motion, Operator, ParsedCommand};
pub use mode::{CaretStyle, Mode};
pub use pending::{PendingCommand, RouteDecision};
pub use register::{Register, YankEntry};
pub use repeat::{LastCommand, RepeatEngine};

use crate::surface::TextSurface;

/// Everything tied to one bound surface: the active mode, the in-progress
/// command, the repeat recording, the insert capture, and the register.
/// Created when a surface gains focus and dropped whole on unbind, so no
/// command state ever leaks across editors.
pub struct Session {
    pub(crate) surface: Box<dyn TextSurface>,
    pub(crate) mode: Mode,
    pub(crate) pending: PendingCommand,
    pub(crate) repeat: RepeatEngine,
    // text captured from the last completed Insert session
    pub(crate) tmp_insert: String,
    // how the current Insert session was entered, for repeat recording
    pub(crate) insert_entry: Option<ParsedCommand>,
    pub(crate) visual_anchor: Option<usize>,
    // mode to return to when a search is finished or abandoned
    pub(crate) search_return: Mode,
    pub(crate) last_search: Option<String>,
    pub(crate) register: Register,
}

impl Session {
    pub fn new(surface: Box<dyn TextSurface>) -> Self {
        Self::with_limits(surface, pending::MAX_PENDING_KEYS, 10)
    }

    pub fn with_limits(
        surface: Box<dyn TextSurface>,
        max_pending_keys: usize,
        register_history: usize,
    ) -> Self {
        Self {
            surface,
            mode: Mode::Normal,
            pending: PendingCommand::with_max_keys(max_pending_keys),
            repeat: RepeatEngine::new(),
            tmp_insert: String::new(),
            insert_entry: None,
            visual_anchor: None,
            search_return: Mode::Normal,
            last_search: None,
            register: Register::new_with_capacity(register_history),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn surface(&self) -> &dyn TextSurface {
        self.surface.as_ref()
    }

    pub fn pending(&self) -> &PendingCommand {
        &self.pending
    }

    pub fn last_command(&self) -> Option<&LastCommand> {
        self.repeat.last()
    }

    /// Text captured from the most recently completed Insert session.
    pub fn temp_insert(&self) -> &str {
        &self.tmp_insert
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    /// Apply a mode change. The pending buffer resets on every mode entry
    /// except into Replacing, whose keystrokes are still command input.
    pub(crate) fn transition(&mut self, to: Mode) {
        if to == Mode::Replacing {
            self.pending.retag(to);
        } else {
            self.pending.reset(to);
        }
        // a search begun in Visual mode keeps the anchor for its return trip
        if to == Mode::Normal {
            self.visual_anchor = None;
        }
        self.mode = to;
    }

    /// A new Insert session starts: remember how it was entered and drop the
    /// previous session's capture.
    pub(crate) fn begin_insert_session(&mut self, cmd: ParsedCommand) {
        self.insert_entry = Some(cmd);
        self.tmp_insert.clear();
    }

    /// The Insert session ends: move the captured text into the temp buffer
    /// and hand it back for repeat recording.
    pub(crate) fn end_insert_session(&mut self) -> String {
        let typed = self.pending.take_capture();
        self.tmp_insert = typed.clone();
        typed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ScratchHandle;
    use crossterm::event::KeyModifiers;

    fn session() -> Session {
        Session::new(Box::new(ScratchHandle::from_text("hello world")))
    }

    #[test]
    fn test_new_session_starts_in_normal_mode() {
        let session = session();
        assert_eq!(session.mode(), Mode::Normal);
        assert!(session.pending().is_empty());
        assert!(session.last_command().is_none());
        assert!(session.temp_insert().is_empty());
    }

    #[test]
    fn test_transition_resets_pending() {
        let mut session = session();
        session.pending.append('3', KeyModifiers::NONE);
        session.transition(Mode::Insert);
        assert!(session.pending().is_empty());
        assert_eq!(session.pending().opened_in(), Mode::Insert);
    }

    #[test]
    fn test_transition_into_replacing_preserves_pending() {
        let mut session = session();
        session.pending.append('R', KeyModifiers::NONE);
        session.transition(Mode::Replacing);
        assert_eq!(session.pending().line(), "R");
        assert_eq!(session.mode(), Mode::Replacing);
    }

    #[test]
    fn test_leaving_visual_clears_anchor() {
        let mut session = session();
        session.transition(Mode::Visual);
        session.visual_anchor = Some(3);
        session.transition(Mode::Normal);
        assert_eq!(session.visual_anchor, None);
    }

    #[test]
    fn test_insert_session_capture_round_trip() {
        let mut session = session();
        session.begin_insert_session(ParsedCommand::new(
            1,
            CommandKind::EnterInsert(InsertEntry::Before),
        ));
        session.transition(Mode::Insert);
        for ch in "abc".chars() {
            session.pending.append(ch, KeyModifiers::NONE);
        }
        let typed = session.end_insert_session();
        assert_eq!(typed, "abc");
        assert_eq!(session.temp_insert(), "abc");
    }
}
