// src/engine/dispatch.rs
use log::debug;

use crate::engine::grammar::{CommandKind, InsertEntry, Motion, Operator, ParsedCommand};
use crate::engine::mode::Mode;
use crate::engine::motion::{self, Span};
use crate::engine::Session;

/// Host-level operation requested by a command, executed by the host after
/// the current event dispatch returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleAction {
    #[default]
    None,
    CloseEditor,
    SaveEditor,
    SaveAndClose,
}

/// The edit a dispatch actually performed, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Move { to: usize },
    Delete { start: usize, end: usize },
    Insert { at: usize, text: String },
    Yank { start: usize, end: usize },
    Put { at: usize, text: String },
    Replace { at: usize, ch: char },
    Search { term: String, found: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub action: Option<EditAction>,
    pub mode: Mode,
    pub repeatable: bool,
    pub lifecycle: LifecycleAction,
    /// Transient message for the host status line (for example an unknown ex
    /// command); `None` leaves the regular mode display in place.
    pub status: Option<String>,
}

impl DispatchResult {
    /// Discarded/no-op outcome: nothing happened, mode unchanged.
    pub fn none(mode: Mode) -> Self {
        Self {
            action: None,
            mode,
            repeatable: false,
            lifecycle: LifecycleAction::None,
            status: None,
        }
    }

    fn edit(action: EditAction, mode: Mode, repeatable: bool) -> Self {
        Self {
            action: Some(action),
            mode,
            repeatable,
            lifecycle: LifecycleAction::None,
            status: None,
        }
    }
}

/// Interpret one completed command against the session's surface. Mode
/// changes are carried in the result; the router applies them. Illegal or
/// inapplicable commands degrade to a discarded no-op, never an error.
pub fn dispatch(session: &mut Session, cmd: &ParsedCommand) -> DispatchResult {
    debug!("dispatch {:?} in {:?}", cmd, session.mode);
    let mode = session.mode;

    match cmd.kind {
        CommandKind::Move(m) => {
            let to = motion::destination(session.surface.as_ref(), m, cmd.count);
            session.surface.set_cursor_position(to);
            DispatchResult::edit(EditAction::Move { to }, mode, false)
        }

        CommandKind::Operate { operator, motion } => {
            let span = motion::span(session.surface.as_ref(), motion, cmd.count);
            let result = apply_operator(session, operator, span);
            if operator == Operator::Change {
                session.begin_insert_session(*cmd);
            }
            result
        }

        CommandKind::OperateSelection(operator) => {
            let span = selection_span(session);
            session.visual_anchor = None;
            let result = apply_operator(session, operator, span);
            if operator == Operator::Change {
                session.begin_insert_session(*cmd);
            }
            result
        }

        CommandKind::DeleteChar => {
            // forward deletion never crosses the line end
            let span = motion::span(session.surface.as_ref(), Motion::Right, cmd.count);
            apply_operator(session, Operator::Delete, span)
        }

        CommandKind::PutAfter => put(session, cmd.count, true),
        CommandKind::PutBefore => put(session, cmd.count, false),

        CommandKind::EnterInsert(entry) => {
            let result = enter_insert(session, entry);
            session.begin_insert_session(*cmd);
            result
        }

        CommandKind::EnterVisual => {
            session.visual_anchor = Some(session.surface.cursor_position());
            DispatchResult::none(Mode::Visual)
        }

        CommandKind::EnterReplacing => DispatchResult::none(Mode::Replacing),

        CommandKind::EnterCommandLine => DispatchResult::none(Mode::Command),

        CommandKind::EnterSearch => {
            session.search_return = mode;
            DispatchResult::none(Mode::Search)
        }

        // replay is coordinated by the router, which owns the repeat engine
        // handoff; reaching here means nothing was recorded
        CommandKind::RepeatLast => DispatchResult::none(mode),

        CommandKind::SearchNext => match session.last_search.clone() {
            Some(term) => run_search(session, &term),
            None => DispatchResult::none(mode),
        },

        CommandKind::SearchWord => {
            let pos = session.surface.cursor_position();
            let (start, end) = session.surface.word_bounds_at(pos);
            if start == end {
                return DispatchResult::none(mode);
            }
            let word = session.surface.get_text_range(start, end);
            session.last_search = Some(word.clone());
            run_search(session, &word)
        }

        CommandKind::ReplaceChar(ch) => replace_char(session, ch),
    }
}

fn apply_operator(session: &mut Session, operator: Operator, span: Span) -> DispatchResult {
    if span.start >= span.end {
        return DispatchResult::none(if session.mode == Mode::Visual {
            Mode::Normal
        } else {
            session.mode
        });
    }

    let mut text = session.surface.get_text_range(span.start, span.end);
    if span.linewise && text.ends_with('\n') {
        text.truncate(text.len() - 1);
    }

    match operator {
        Operator::Delete => {
            session.register.yank(text, span.linewise);
            session.surface.delete_range(span.start, span.end);
            session.surface.set_cursor_position(span.start);
            DispatchResult::edit(
                EditAction::Delete { start: span.start, end: span.end },
                Mode::Normal,
                true,
            )
        }
        Operator::Yank => {
            session.register.yank(text, span.linewise);
            session.surface.set_cursor_position(span.start);
            DispatchResult::edit(
                EditAction::Yank { start: span.start, end: span.end },
                Mode::Normal,
                false,
            )
        }
        Operator::Change => {
            let reopen_line = span.linewise
                && session
                    .surface
                    .get_text_range(span.end.saturating_sub(1), span.end)
                    == "\n";
            session.register.yank(text, span.linewise);
            session.surface.delete_range(span.start, span.end);
            if reopen_line {
                session.surface.insert_text(span.start, "\n");
            }
            session.surface.set_cursor_position(span.start);
            // repeatability is decided when the insert session ends
            DispatchResult::edit(
                EditAction::Delete { start: span.start, end: span.end },
                Mode::Insert,
                false,
            )
        }
    }
}

fn selection_span(session: &Session) -> Span {
    let cursor = session.surface.cursor_position();
    let anchor = session.visual_anchor.unwrap_or(cursor);
    let (start, end) = (anchor.min(cursor), anchor.max(cursor));
    // the character under the cursor is part of the selection
    Span {
        start,
        end: (end + 1).min(session.surface.length()),
        linewise: false,
    }
}

fn put(session: &mut Session, count: usize, after: bool) -> DispatchResult {
    let entry = match session.register.peek() {
        Some(entry) => entry.clone(),
        None => return DispatchResult::none(session.mode),
    };
    let cursor = session.surface.cursor_position();

    if entry.linewise {
        let chunk: Vec<&str> = std::iter::repeat(entry.text.as_str()).take(count).collect();
        let text = chunk.join("\n");
        let at = if after {
            let line_end = motion::destination(session.surface.as_ref(), Motion::LineEnd, 1);
            if line_end >= session.surface.length() {
                // last line: open a new one below
                session.surface.insert_text(line_end, &format!("\n{}", text));
                session.surface.set_cursor_position(line_end + 1);
                return DispatchResult::edit(
                    EditAction::Put { at: line_end + 1, text },
                    Mode::Normal,
                    true,
                );
            }
            line_end + 1
        } else {
            motion::destination(session.surface.as_ref(), Motion::LineStart, 1)
        };
        session.surface.insert_text(at, &format!("{}\n", text));
        session.surface.set_cursor_position(at);
        DispatchResult::edit(EditAction::Put { at, text }, Mode::Normal, true)
    } else {
        let text = entry.text.repeat(count);
        let at = if after {
            let line_end = motion::destination(session.surface.as_ref(), Motion::LineEnd, 1);
            (cursor + 1).min(line_end)
        } else {
            cursor
        };
        session.surface.insert_text(at, &text);
        let len = text.chars().count();
        session.surface.set_cursor_position(at + len - 1);
        DispatchResult::edit(EditAction::Put { at, text }, Mode::Normal, true)
    }
}

fn enter_insert(session: &mut Session, entry: InsertEntry) -> DispatchResult {
    let surface = session.surface.as_mut();
    match entry {
        InsertEntry::Before => {}
        InsertEntry::After => {
            let to = motion::destination(surface, Motion::Right, 1);
            surface.set_cursor_position(to);
        }
        InsertEntry::EndOfLine => {
            let to = motion::destination(surface, Motion::LineEnd, 1);
            surface.set_cursor_position(to);
        }
        InsertEntry::StartOfLine => {
            let to = motion::destination(surface, Motion::LineStart, 1);
            surface.set_cursor_position(to);
        }
        InsertEntry::LineBelow => {
            let line_end = motion::destination(surface, Motion::LineEnd, 1);
            surface.insert_text(line_end, "\n");
            surface.set_cursor_position(line_end + 1);
            return DispatchResult::edit(
                EditAction::Insert { at: line_end, text: "\n".to_string() },
                Mode::Insert,
                false,
            );
        }
        InsertEntry::LineAbove => {
            let line_start = motion::destination(surface, Motion::LineStart, 1);
            surface.insert_text(line_start, "\n");
            surface.set_cursor_position(line_start);
            return DispatchResult::edit(
                EditAction::Insert { at: line_start, text: "\n".to_string() },
                Mode::Insert,
                false,
            );
        }
    }
    DispatchResult::none(Mode::Insert)
}

fn replace_char(session: &mut Session, ch: char) -> DispatchResult {
    if ch.is_control() {
        return DispatchResult::none(Mode::Replacing);
    }
    let pos = session.surface.cursor_position();
    let under = session.surface.get_text_range(pos, pos + 1);
    if !under.is_empty() && under != "\n" {
        session.surface.delete_range(pos, pos + 1);
    }
    session.surface.insert_text(pos, &ch.to_string());
    session.surface.set_cursor_position(pos + 1);
    DispatchResult::edit(EditAction::Replace { at: pos, ch }, Mode::Replacing, true)
}

/// Forward search with wraparound. Leaves the cursor on the match; a miss
/// only produces a status message.
pub(crate) fn run_search(session: &mut Session, term: &str) -> DispatchResult {
    let mode = session.mode;
    if term.is_empty() {
        return DispatchResult::none(mode);
    }
    let len = session.surface.length();
    let text: Vec<char> = session.surface.get_text_range(0, len).chars().collect();
    let needle: Vec<char> = term.chars().collect();
    let found = find_from(&text, &needle, session.surface.cursor_position() + 1);

    match found {
        Some(at) => {
            session.surface.set_cursor_position(at);
            DispatchResult::edit(
                EditAction::Search { term: term.to_string(), found: true },
                mode,
                false,
            )
        }
        None => DispatchResult {
            action: Some(EditAction::Search { term: term.to_string(), found: false }),
            mode,
            repeatable: false,
            lifecycle: LifecycleAction::None,
            status: Some(format!("Pattern not found: {}", term)),
        },
    }
}

fn find_from(text: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > text.len() {
        return None;
    }
    let starts = (from..=text.len() - needle.len()).chain(0..from.min(text.len() - needle.len() + 1));
    for start in starts {
        if text[start..start + needle.len()] == *needle {
            return Some(start);
        }
    }
    None
}

/// Execute an accumulated ex-style command line. Only the host-level
/// file operations are recognized; anything else is reported and discarded.
pub(crate) fn execute_ex(line: &str) -> DispatchResult {
    let lifecycle = match line.trim() {
        "" => LifecycleAction::None,
        "w" | "write" => LifecycleAction::SaveEditor,
        "q" | "quit" | "q!" | "quit!" => LifecycleAction::CloseEditor,
        "wq" | "x" => LifecycleAction::SaveAndClose,
        other => {
            return DispatchResult {
                action: None,
                mode: Mode::Normal,
                repeatable: false,
                lifecycle: LifecycleAction::None,
                status: Some(format!("Not an editor command: {}", other)),
            }
        }
    };
    DispatchResult {
        action: None,
        mode: Mode::Normal,
        repeatable: false,
        lifecycle,
        status: None,
    }
}
