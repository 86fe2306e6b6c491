// src/input/router.rs
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};

use crate::config::VimConfig;
use crate::engine::dispatch::{self, DispatchResult, LifecycleAction};
use crate::engine::grammar::{CommandKind, Motion};
use crate::engine::mode::{CaretStyle, Mode};
use crate::engine::motion;
use crate::engine::pending::RouteDecision;
use crate::engine::{repeat, Session};
use crate::surface::TextSurface;

/// Outbound message to the host. The router queues these during an event and
/// the host drains them after the handler returns, so lifecycle operations
/// never run while the surface that requested them is still dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    StatusMessage(String),
    CaretStyle(CaretStyle),
    Lifecycle(LifecycleAction),
}

/// Routes raw key events from the host into the command machinery. Holds at
/// most one bound session; binding a new surface always tears the previous
/// one down first, so no key event ever reaches a half-built session.
pub struct VimRouter {
    enabled: bool,
    session: Option<Session>,
    signals: Vec<HostSignal>,
    transient_status: Option<String>,
    max_pending_keys: usize,
    register_history: usize,
}

impl VimRouter {
    pub fn new() -> Self {
        Self::with_config(&VimConfig::default())
    }

    pub fn with_config(config: &VimConfig) -> Self {
        Self {
            enabled: config.enabled,
            session: None,
            signals: Vec::new(),
            transient_status: None,
            max_pending_keys: config.max_pending_keys,
            register_history: config.register_history,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reflects the user setting. Disabling unbinds immediately; re-enabling
    /// leaves binding to the next focus event from the host.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.teardown(true);
        }
        self.enabled = enabled;
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.session.as_ref().map(Session::mode)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Pull everything queued since the last drain. Hosts call this once per
    /// event, after the intake call returns.
    pub fn drain_signals(&mut self) -> Vec<HostSignal> {
        std::mem::take(&mut self.signals)
    }

    // ---- focus lifecycle ----

    pub fn on_surface_focused(&mut self, surface: Box<dyn TextSurface>) {
        if !self.enabled {
            return;
        }
        self.teardown(true);
        if !surface.is_alive() {
            // host handed us a widget that is already gone
            return;
        }
        info!("binding editor surface");
        self.session = Some(Session::with_limits(
            surface,
            self.max_pending_keys,
            self.register_history,
        ));
        self.update_view();
    }

    pub fn on_surface_unfocused(&mut self) {
        self.teardown(true);
    }

    pub fn on_editor_closing(&mut self) {
        self.teardown(true);
    }

    pub fn on_workspace_closing(&mut self) {
        // the widget is going away with the workspace; don't touch it
        self.teardown(false);
    }

    pub fn on_all_editors_closing(&mut self) {
        self.teardown(false);
    }

    fn teardown(&mut self, restore_caret: bool) {
        if let Some(mut session) = self.session.take() {
            info!("unbinding editor surface");
            if restore_caret && session.surface.is_alive() {
                session.surface.set_caret_style(CaretStyle::Bar);
            }
            self.transient_status = None;
            self.signals.push(HostSignal::StatusMessage(String::new()));
        }
    }

    // A surface that died between events forces an unbind instead of a fault.
    fn surface_usable(&mut self) -> bool {
        let alive = match &self.session {
            Some(session) => session.surface.is_alive(),
            None => return false,
        };
        if !alive {
            self.teardown(false);
        }
        alive
    }

    // ---- key intake ----

    /// Special-key path: escape, return, and backspace are first-class and
    /// handled here; everything else is the host's.
    pub fn on_key_down(&mut self, key: KeyEvent) -> RouteDecision {
        if !self.enabled || !self.surface_usable() {
            return RouteDecision::PassThrough;
        }
        let decision = match key.code {
            KeyCode::Backspace => self.handle_backspace(),
            KeyCode::Esc => self.handle_escape(),
            KeyCode::Enter => self.handle_return(),
            _ => RouteDecision::PassThrough,
        };
        self.update_view();
        decision
    }

    /// Character path: feed the pending command and dispatch on completion.
    pub fn on_char(&mut self, ch: char, modifiers: KeyModifiers) -> RouteDecision {
        if !self.enabled || !self.surface_usable() {
            return RouteDecision::PassThrough;
        }
        let decision = match self.session.as_mut() {
            Some(session) => session.pending.append(ch, modifiers),
            None => return RouteDecision::PassThrough,
        };
        if self
            .session
            .as_ref()
            .map(|s| s.pending.is_complete())
            .unwrap_or(false)
        {
            self.dispatch_pending();
        }
        self.update_view();
        decision
    }

    fn dispatch_pending(&mut self) {
        let result = {
            let session = match self.session.as_mut() {
                Some(session) => session,
                None => return,
            };
            match session.pending.parsed() {
                None => {
                    // unrecognized: graceful discard, LastCommand untouched
                    debug!("discarding unrecognized sequence {:?}", session.pending.line());
                    DispatchResult::none(session.mode())
                }
                Some(cmd) if cmd.kind == CommandKind::RepeatLast => repeat::replay(session),
                Some(cmd) => {
                    let result = dispatch::dispatch(session, &cmd);
                    session.repeat.record(&result, cmd, None);
                    result
                }
            }
        };
        self.finish_dispatch(result);
    }

    fn finish_dispatch(&mut self, result: DispatchResult) {
        if let Some(session) = self.session.as_mut() {
            session.transition(result.mode);
        }
        self.transient_status = result.status;
        if result.lifecycle != LifecycleAction::None {
            self.signals.push(HostSignal::Lifecycle(result.lifecycle));
        }
    }

    fn handle_backspace(&mut self) -> RouteDecision {
        match self.session.as_mut() {
            Some(session) => {
                if session.pending.delete_last() {
                    RouteDecision::Consumed
                } else {
                    // nothing buffered; the host's own backspace runs
                    RouteDecision::PassThrough
                }
            }
            None => RouteDecision::PassThrough,
        }
    }

    fn handle_escape(&mut self) -> RouteDecision {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return RouteDecision::PassThrough,
        };
        match session.mode() {
            Mode::Insert => {
                let typed = session.end_insert_session();
                // land on the last inserted character, not after it
                let to = motion::destination(session.surface.as_ref(), Motion::Left, 1);
                session.surface.set_cursor_position(to);
                let entry = session.insert_entry.take();
                if !typed.is_empty() {
                    if let Some(entry) = entry {
                        session.repeat.record_insert(entry, typed);
                    }
                }
                session.transition(Mode::Normal);
            }
            Mode::Search => {
                // abandon the partial term, back to wherever search began
                let back = session.search_return;
                session.transition(back);
            }
            _ => session.transition(Mode::Normal),
        }
        RouteDecision::Consumed
    }

    fn handle_return(&mut self) -> RouteDecision {
        let result = {
            let session = match self.session.as_mut() {
                Some(session) => session,
                None => return RouteDecision::PassThrough,
            };
            match session.mode() {
                Mode::Command => {
                    let line = session.pending.line().to_string();
                    debug!("ex command line {:?}", line);
                    Some(dispatch::execute_ex(&line))
                }
                Mode::Search => {
                    let term = session.pending.line().to_string();
                    let back = session.search_return;
                    let mut result = if term.is_empty() {
                        DispatchResult::none(back)
                    } else {
                        session.last_search = Some(term.clone());
                        dispatch::run_search(session, &term)
                    };
                    result.mode = back;
                    Some(result)
                }
                Mode::Insert => {
                    // the host inserts the newline; track it for replay
                    session.pending.capture_push('\n');
                    None
                }
                _ => None,
            }
        };
        match result {
            Some(result) => {
                self.finish_dispatch(result);
                RouteDecision::Consumed
            }
            None => RouteDecision::PassThrough,
        }
    }

    // Refresh after every event: the caret follows the mode, the status line
    // shows either a transient message, the line being typed, an in-progress
    // sequence, or the mode label.
    fn update_view(&mut self) {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return,
        };
        let style = session.mode().caret_style();
        session.surface.set_caret_style(style);
        self.signals.push(HostSignal::CaretStyle(style));

        let message = if let Some(text) = self.transient_status.take() {
            text
        } else if session.mode().is_line_mode() {
            format!("{}{}", session.mode().line_prefix(), session.pending.line())
        } else if !session.pending.is_empty() && session.mode() != Mode::Replacing {
            session.pending.line().to_string()
        } else {
            session.mode().label().to_string()
        };
        self.signals.push(HostSignal::StatusMessage(message));
    }
}

impl Default for VimRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ScratchHandle;

    fn bound_router(text: &str) -> (VimRouter, ScratchHandle) {
        let handle = ScratchHandle::from_text(text);
        let mut router = VimRouter::new();
        router.on_surface_focused(Box::new(handle.clone()));
        router.drain_signals();
        (router, handle)
    }

    fn feed(router: &mut VimRouter, keys: &str) {
        for ch in keys.chars() {
            router.on_char(ch, KeyModifiers::NONE);
        }
    }

    fn press(router: &mut VimRouter, code: KeyCode) -> RouteDecision {
        router.on_key_down(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn last_status(router: &mut VimRouter) -> Option<String> {
        router
            .drain_signals()
            .into_iter()
            .rev()
            .find_map(|signal| match signal {
                HostSignal::StatusMessage(text) => Some(text),
                _ => None,
            })
    }

    #[test]
    fn test_binding_starts_in_normal_with_block_caret() {
        let handle = ScratchHandle::from_text("hello");
        let mut router = VimRouter::new();
        router.on_surface_focused(Box::new(handle.clone()));
        assert_eq!(router.mode(), Some(Mode::Normal));
        assert_eq!(handle.caret(), CaretStyle::Block);
        let signals = router.drain_signals();
        assert!(signals.contains(&HostSignal::StatusMessage("NORMAL".to_string())));
    }

    #[test]
    fn test_count_operator_motion_end_to_end() {
        // "3dw" deletes three words from the cursor and is repeatable
        let (mut router, handle) = bound_router("one two three four");
        feed(&mut router, "3dw");
        assert_eq!(handle.text(), "four");
        assert_eq!(router.mode(), Some(Mode::Normal));
        let session = router.session().unwrap();
        assert!(session.last_command().is_some());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_escape_from_insert_captures_typed_text() {
        let (mut router, handle) = bound_router("");
        feed(&mut router, "i");
        assert_eq!(router.mode(), Some(Mode::Insert));
        // the host owns plain insert-mode text; apply it like a host would
        for ch in "hello".chars() {
            let decision = router.on_char(ch, KeyModifiers::NONE);
            assert_eq!(decision, RouteDecision::PassThrough);
            let at = handle.cursor_position();
            let mut surface = handle.clone();
            surface.insert_text(at, &ch.to_string());
        }
        press(&mut router, KeyCode::Esc);
        assert_eq!(router.mode(), Some(Mode::Normal));
        assert_eq!(router.session().unwrap().temp_insert(), "hello");
        assert_eq!(handle.text(), "hello");
    }

    #[test]
    fn test_insert_entry_is_not_repeatable_by_itself() {
        let (mut router, handle) = bound_router("hello");
        feed(&mut router, "i");
        assert_eq!(router.mode(), Some(Mode::Insert));
        assert_eq!(handle.text(), "hello");
        assert_eq!(handle.caret(), CaretStyle::Bar);
        assert!(router.session().unwrap().last_command().is_none());
    }

    #[test]
    fn test_repeat_applies_at_new_cursor() {
        let (mut router, handle) = bound_router("one two three four");
        feed(&mut router, "3dw");
        assert_eq!(handle.text(), "four");

        let mut surface = handle.clone();
        surface.insert_text(0, "a b c ");
        surface.set_cursor_position(0);
        feed(&mut router, ".");
        assert_eq!(handle.text(), "four");
    }

    #[test]
    fn test_repeat_insert_session() {
        let (mut router, handle) = bound_router("one\ntwo");
        feed(&mut router, "i");
        router.on_char('X', KeyModifiers::NONE);
        let mut surface = handle.clone();
        surface.insert_text(0, "X");
        press(&mut router, KeyCode::Esc);
        assert_eq!(handle.text(), "Xone\ntwo");

        surface.set_cursor_position(5);
        feed(&mut router, ".");
        assert_eq!(handle.text(), "Xone\nXtwo");
        assert_eq!(router.mode(), Some(Mode::Normal));
    }

    #[test]
    fn test_unrecognized_sequence_is_discarded() {
        let (mut router, handle) = bound_router("one two three four");
        feed(&mut router, "3dw"); // establish a repeat target
        let before = router.session().unwrap().last_command().cloned();

        feed(&mut router, "zzz");
        assert_eq!(handle.text(), "four");
        assert_eq!(router.mode(), Some(Mode::Normal));
        let session = router.session().unwrap();
        assert!(session.pending().is_empty());
        assert_eq!(session.last_command().cloned(), before);
    }

    #[test]
    fn test_plain_text_passes_through_in_insert() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, "i");
        for ch in "xy".chars() {
            assert_eq!(router.on_char(ch, KeyModifiers::NONE), RouteDecision::PassThrough);
        }
        // grammar state stays untouched
        assert!(router.session().unwrap().pending().line().is_empty());
    }

    #[test]
    fn test_disabled_router_intercepts_nothing() {
        let handle = ScratchHandle::from_text("abc");
        let mut router = VimRouter::new();
        router.set_enabled(false);
        router.on_surface_focused(Box::new(handle.clone()));
        assert!(!router.is_bound());
        assert_eq!(router.on_char('x', KeyModifiers::NONE), RouteDecision::PassThrough);
        assert_eq!(press(&mut router, KeyCode::Esc), RouteDecision::PassThrough);
    }

    #[test]
    fn test_disabling_tears_down_and_restores_caret() {
        let (mut router, handle) = bound_router("abc");
        assert_eq!(handle.caret(), CaretStyle::Block);
        router.set_enabled(false);
        assert!(!router.is_bound());
        assert_eq!(handle.caret(), CaretStyle::Bar);
    }

    #[test]
    fn test_rebinding_isolates_repeat_history() {
        let (mut router, _) = bound_router("one two three");
        feed(&mut router, "dw");
        assert!(router.session().unwrap().last_command().is_some());

        let other = ScratchHandle::from_text("fresh text");
        router.on_surface_focused(Box::new(other.clone()));
        assert!(router.session().unwrap().last_command().is_none());

        // repeating on the new surface does nothing
        feed(&mut router, ".");
        assert_eq!(other.text(), "fresh text");
    }

    #[test]
    fn test_dead_surface_forces_unbind() {
        let (mut router, handle) = bound_router("abc");
        handle.kill();
        assert_eq!(router.on_char('x', KeyModifiers::NONE), RouteDecision::PassThrough);
        assert!(!router.is_bound());
    }

    #[test]
    fn test_focusing_a_dead_surface_stays_unbound() {
        let handle = ScratchHandle::from_text("abc");
        handle.kill();
        let mut router = VimRouter::new();
        router.on_surface_focused(Box::new(handle));
        assert!(!router.is_bound());
    }

    #[test]
    fn test_ex_command_defers_lifecycle() {
        let (mut router, handle) = bound_router("abc");
        feed(&mut router, ":");
        assert_eq!(router.mode(), Some(Mode::Command));
        feed(&mut router, "wq");
        assert_eq!(press(&mut router, KeyCode::Enter), RouteDecision::Consumed);
        assert_eq!(router.mode(), Some(Mode::Normal));
        assert_eq!(handle.text(), "abc");
        let signals = router.drain_signals();
        assert!(signals.contains(&HostSignal::Lifecycle(LifecycleAction::SaveAndClose)));
    }

    #[test]
    fn test_unknown_ex_command_reports_status() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, ":frob");
        router.drain_signals();
        press(&mut router, KeyCode::Enter);
        assert_eq!(
            last_status(&mut router).as_deref(),
            Some("Not an editor command: frob")
        );
        assert_eq!(router.mode(), Some(Mode::Normal));
    }

    #[test]
    fn test_command_line_echoes_on_status() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, ":w");
        assert_eq!(last_status(&mut router).as_deref(), Some(":w"));
    }

    #[test]
    fn test_escape_from_search_restores_previous_mode() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, "v");
        assert_eq!(router.mode(), Some(Mode::Visual));
        feed(&mut router, "/ab");
        assert_eq!(router.mode(), Some(Mode::Search));
        press(&mut router, KeyCode::Esc);
        assert_eq!(router.mode(), Some(Mode::Visual));
    }

    #[test]
    fn test_search_executes_on_return() {
        let (mut router, handle) = bound_router("one two one");
        feed(&mut router, "/two");
        press(&mut router, KeyCode::Enter);
        assert_eq!(router.mode(), Some(Mode::Normal));
        assert_eq!(handle.cursor_position(), 4);
        // 'n' repeats the search
        feed(&mut router, "n");
        assert_eq!(handle.cursor_position(), 4); // only match, wraps to itself
    }

    #[test]
    fn test_backspace_edits_pending_then_falls_through() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, "3d");
        assert_eq!(press(&mut router, KeyCode::Backspace), RouteDecision::Consumed);
        assert_eq!(press(&mut router, KeyCode::Backspace), RouteDecision::Consumed);
        // buffer now empty: the host's backspace should run
        assert_eq!(press(&mut router, KeyCode::Backspace), RouteDecision::PassThrough);
    }

    #[test]
    fn test_replacing_mode_replaces_per_keystroke() {
        let (mut router, handle) = bound_router("abcd");
        feed(&mut router, "R");
        assert_eq!(router.mode(), Some(Mode::Replacing));
        feed(&mut router, "xy");
        assert_eq!(handle.text(), "xycd");
        assert_eq!(router.mode(), Some(Mode::Replacing));
        press(&mut router, KeyCode::Esc);
        assert_eq!(router.mode(), Some(Mode::Normal));
        // the last replace is the repeat target
        let mut surface = handle.clone();
        surface.set_cursor_position(3);
        feed(&mut router, ".");
        assert_eq!(handle.text(), "xycy");
    }

    #[test]
    fn test_mode_is_always_one_of_the_six() {
        let (mut router, _) = bound_router("one two\nthree");
        for ch in "3dwiab\\zzvy:q/x*.pP".chars() {
            router.on_char(ch, KeyModifiers::NONE);
            let mode = router.mode().unwrap();
            assert!(matches!(
                mode,
                Mode::Normal
                    | Mode::Insert
                    | Mode::Command
                    | Mode::Visual
                    | Mode::Search
                    | Mode::Replacing
            ));
        }
        press(&mut router, KeyCode::Esc);
        press(&mut router, KeyCode::Esc);
        assert_eq!(router.mode(), Some(Mode::Normal));
    }

    #[test]
    fn test_visual_selection_delete() {
        let (mut router, handle) = bound_router("abcdef");
        feed(&mut router, "v");
        feed(&mut router, "ll");
        feed(&mut router, "d");
        assert_eq!(handle.text(), "def");
        assert_eq!(router.mode(), Some(Mode::Normal));
    }

    #[test]
    fn test_status_shows_pending_sequence() {
        let (mut router, _) = bound_router("abc");
        feed(&mut router, "2d");
        assert_eq!(last_status(&mut router).as_deref(), Some("2d"));
    }
}
