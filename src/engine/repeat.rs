// src/engine/repeat.rs
use log::debug;

use crate::engine::dispatch::{self, DispatchResult, EditAction};
use crate::engine::grammar::ParsedCommand;
use crate::engine::mode::Mode;
use crate::engine::Session;

/// Snapshot of the most recent repeatable command, plus the text typed if it
/// opened an Insert session. Overwritten only by the next repeatable command,
/// so motions and discarded input never clobber it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCommand {
    pub cmd: ParsedCommand,
    pub insert_text: Option<String>,
}

#[derive(Debug, Default)]
pub struct RepeatEngine {
    last: Option<LastCommand>,
}

impl RepeatEngine {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Store the dispatched command as the repeat target; a non-repeatable
    /// result is a no-op and leaves the previous recording in place.
    pub fn record(&mut self, result: &DispatchResult, cmd: ParsedCommand, insert_text: Option<String>) {
        if !result.repeatable {
            return;
        }
        debug!("recording repeat target {:?}", cmd);
        self.last = Some(LastCommand { cmd, insert_text });
    }

    /// Store a completed Insert session: the entry command plus the text the
    /// session captured. Called when Escape closes the session.
    pub fn record_insert(&mut self, cmd: ParsedCommand, typed: String) {
        debug!("recording insert session {:?} ({} chars)", cmd, typed.chars().count());
        self.last = Some(LastCommand { cmd, insert_text: Some(typed) });
    }

    pub fn last(&self) -> Option<&LastCommand> {
        self.last.as_ref()
    }

    pub fn has_recording(&self) -> bool {
        self.last.is_some()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Re-apply the recorded command against the current cursor position. An
/// insert session re-runs its entry positioning and re-inserts the captured
/// text verbatim, then lands back in Normal mode. With nothing recorded this
/// is a no-op.
pub fn replay(session: &mut Session) -> DispatchResult {
    let last = match &session.repeat.last {
        Some(last) => last.clone(),
        None => return DispatchResult::none(session.mode()),
    };

    let mut result = dispatch::dispatch(session, &last.cmd);
    if result.mode == Mode::Insert {
        if let Some(text) = last.insert_text.filter(|t| !t.is_empty()) {
            let at = session.surface.cursor_position();
            session.surface.insert_text(at, &text);
            session.surface.set_cursor_position(at + text.chars().count());
            result.action = Some(EditAction::Insert { at, text });
        }
        session.insert_entry = None;
        result.mode = Mode::Normal;
        result.repeatable = true;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar::{CommandKind, InsertEntry, Motion, Operator};
    use crate::surface::ScratchHandle;

    fn session_at(text: &str, cursor: usize) -> (Session, ScratchHandle) {
        let handle = ScratchHandle::from_text(text);
        let mut session = Session::new(Box::new(handle.clone()));
        session.surface.set_cursor_position(cursor);
        (session, handle)
    }

    fn delete_words(count: usize) -> ParsedCommand {
        ParsedCommand::new(
            count,
            CommandKind::Operate { operator: Operator::Delete, motion: Motion::WordForward },
        )
    }

    #[test]
    fn test_non_repeatable_results_are_ignored() {
        let mut engine = RepeatEngine::new();
        let result = DispatchResult::none(Mode::Normal);
        engine.record(&result, ParsedCommand::new(1, CommandKind::Move(Motion::Left)), None);
        assert!(!engine.has_recording());
    }

    #[test]
    fn test_record_keeps_previous_on_non_repeatable() {
        let (mut session, _) = session_at("one two three", 0);
        let cmd = delete_words(1);
        let result = dispatch::dispatch(&mut session, &cmd);
        session.repeat.record(&result, cmd, None);
        assert!(session.repeat.has_recording());

        // a motion afterwards must not clobber the recording
        let motion = ParsedCommand::new(1, CommandKind::Move(Motion::WordForward));
        let result = dispatch::dispatch(&mut session, &motion);
        session.repeat.record(&result, motion, None);
        assert_eq!(session.repeat.last().unwrap().cmd, delete_words(1));
    }

    #[test]
    fn test_replay_with_nothing_recorded_is_noop() {
        let (mut session, handle) = session_at("one two", 0);
        let result = replay(&mut session);
        assert_eq!(result.action, None);
        assert_eq!(handle.text(), "one two");
    }

    #[test]
    fn test_replay_applies_at_current_cursor() {
        let (mut session, handle) = session_at("one two three four", 0);
        let cmd = delete_words(1);
        let result = dispatch::dispatch(&mut session, &cmd);
        session.repeat.record(&result, cmd, None);
        assert_eq!(handle.text(), "two three four");

        // move somewhere else; the repeat works from there, not from 0
        session.surface.set_cursor_position(4);
        let result = replay(&mut session);
        assert_eq!(handle.text(), "two four");
        assert!(result.repeatable);
    }

    #[test]
    fn test_replay_twice_applies_twice() {
        let (mut session, handle) = session_at("a b c d", 0);
        let cmd = delete_words(1);
        let result = dispatch::dispatch(&mut session, &cmd);
        session.repeat.record(&result, cmd, None);
        replay(&mut session);
        replay(&mut session);
        assert_eq!(handle.text(), "d");
    }

    #[test]
    fn test_replay_insert_session_reinserts_text() {
        let (mut session, handle) = session_at("one\ntwo", 0);
        session
            .repeat
            .record_insert(ParsedCommand::new(1, CommandKind::EnterInsert(InsertEntry::Before)), "X".to_string());

        session.surface.set_cursor_position(4);
        let result = replay(&mut session);
        assert_eq!(handle.text(), "one\nXtwo");
        assert_eq!(result.mode, Mode::Normal);
        assert_eq!(result.action, Some(EditAction::Insert { at: 4, text: "X".to_string() }));
    }

    #[test]
    fn test_replay_change_session_redoes_delete_and_insert() {
        let (mut session, handle) = session_at("one two", 0);
        let cmd = ParsedCommand::new(
            1,
            CommandKind::Operate { operator: Operator::Change, motion: Motion::WordForward },
        );
        dispatch::dispatch(&mut session, &cmd);
        assert_eq!(handle.text(), "two");
        session.repeat.record_insert(cmd, "ONE ".to_string());

        // simulate the host having typed the replacement already
        session.surface.insert_text(0, "ONE ");
        session.surface.set_cursor_position(4);
        replay(&mut session);
        assert_eq!(handle.text(), "ONE ONE ");
    }
}
