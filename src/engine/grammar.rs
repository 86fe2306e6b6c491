// src/engine/grammar.rs
use crate::engine::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,     // 'd'
    Change,     // 'c'
    Yank,       // 'y'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,           // 'h'
    Right,          // 'l'
    Up,             // 'k'
    Down,           // 'j'
    WordForward,    // 'w'
    WordBack,       // 'b'
    WordEnd,        // 'e'
    LineStart,      // '0'
    LineEnd,        // '$'
    FirstLine,      // 'gg'
    LastLine,       // 'G'
    CurrentLine,    // doubled operator (dd, yy, cc)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertEntry {
    Before,         // 'i'
    After,          // 'a'
    EndOfLine,      // 'A'
    StartOfLine,    // 'I'
    LineBelow,      // 'o'
    LineAbove,      // 'O'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Move(Motion),
    Operate { operator: Operator, motion: Motion },
    // Visual mode: operator applied to the anchor..cursor selection
    OperateSelection(Operator),
    DeleteChar,             // 'x'
    PutAfter,               // 'p'
    PutBefore,              // 'P'
    EnterInsert(InsertEntry),
    EnterVisual,            // 'v'
    EnterReplacing,         // 'R'
    EnterCommandLine,       // ':'
    EnterSearch,            // '/'
    RepeatLast,             // '.'
    SearchNext,             // 'n'
    SearchWord,             // '*'
    ReplaceChar(char),      // any key while Replacing
}

/// A fully resolved command. `count` is always effective (>= 1); a prefix
/// count and a post-operator count multiply, Vim style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand {
    pub count: usize,
    pub kind: CommandKind,
}

impl ParsedCommand {
    pub fn new(count: usize, kind: CommandKind) -> Self {
        Self { count: count.max(1), kind }
    }
}

/// Outcome of matching an accumulated key sequence against the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parse {
    /// A longer sequence could still complete.
    Pending,
    Complete(ParsedCommand),
    /// No rule matches and no further key could make one match.
    Unrecognized,
}

/// Match `raw` against the grammar for `mode`. Command and Search mode
/// sequences accumulate until Return and never complete through here.
pub fn parse(mode: Mode, raw: &str) -> Parse {
    match mode {
        Mode::Normal => parse_normal(raw),
        Mode::Visual => parse_visual(raw),
        Mode::Replacing => parse_replacing(raw),
        Mode::Insert | Mode::Command | Mode::Search => Parse::Pending,
    }
}

fn parse_normal(raw: &str) -> Parse {
    let mut chars = raw.chars().peekable();
    let count = match scan_count(&mut chars) {
        CountScan::BareZero => return complete(1, CommandKind::Move(Motion::LineStart), chars),
        CountScan::Count(n) => n,
    };

    let head = match chars.next() {
        Some(c) => c,
        None => return Parse::Pending,
    };

    if let Some(operator) = operator_for(head) {
        let count2 = match scan_count(&mut chars) {
            // '0' directly after an operator is the line-start motion (d0).
            CountScan::BareZero => {
                return complete(count, CommandKind::Operate { operator, motion: Motion::LineStart }, chars)
            }
            CountScan::Count(n) => n,
        };
        let total = count.saturating_mul(count2);
        return match chars.next() {
            None => Parse::Pending,
            Some(c) if c == head => {
                complete(total, CommandKind::Operate { operator, motion: Motion::CurrentLine }, chars)
            }
            Some(c) => match motion_for(c, &mut chars) {
                Parse::Complete(m) => complete(total, CommandKind::Operate { operator, motion: motion_of(m) }, chars),
                other => other,
            },
        };
    }

    let kind = match head {
        'x' => CommandKind::DeleteChar,
        'p' => CommandKind::PutAfter,
        'P' => CommandKind::PutBefore,
        '.' => CommandKind::RepeatLast,
        'n' => CommandKind::SearchNext,
        '*' => CommandKind::SearchWord,
        'i' => CommandKind::EnterInsert(InsertEntry::Before),
        'a' => CommandKind::EnterInsert(InsertEntry::After),
        'A' => CommandKind::EnterInsert(InsertEntry::EndOfLine),
        'I' => CommandKind::EnterInsert(InsertEntry::StartOfLine),
        'o' => CommandKind::EnterInsert(InsertEntry::LineBelow),
        'O' => CommandKind::EnterInsert(InsertEntry::LineAbove),
        'v' => CommandKind::EnterVisual,
        'R' => CommandKind::EnterReplacing,
        ':' => CommandKind::EnterCommandLine,
        '/' => CommandKind::EnterSearch,
        _ => {
            return match motion_for(head, &mut chars) {
                Parse::Complete(m) => complete(count, CommandKind::Move(motion_of(m)), chars),
                other => other,
            }
        }
    };
    complete(count, kind, chars)
}

fn parse_visual(raw: &str) -> Parse {
    let mut chars = raw.chars().peekable();
    let count = match scan_count(&mut chars) {
        CountScan::BareZero => return complete(1, CommandKind::Move(Motion::LineStart), chars),
        CountScan::Count(n) => n,
    };

    let head = match chars.next() {
        Some(c) => c,
        None => return Parse::Pending,
    };

    let kind = match head {
        'd' | 'x' => CommandKind::OperateSelection(Operator::Delete),
        'y' => CommandKind::OperateSelection(Operator::Yank),
        'c' => CommandKind::OperateSelection(Operator::Change),
        '/' => CommandKind::EnterSearch,
        _ => {
            return match motion_for(head, &mut chars) {
                Parse::Complete(m) => complete(count, CommandKind::Move(motion_of(m)), chars),
                other => other,
            }
        }
    };
    complete(count, kind, chars)
}

// Every keystroke while replacing is its own complete command. The buffer
// is preserved across Replacing dispatches, so only the newest key matters.
fn parse_replacing(raw: &str) -> Parse {
    match raw.chars().last() {
        Some(c) => Parse::Complete(ParsedCommand::new(1, CommandKind::ReplaceChar(c))),
        None => Parse::Pending,
    }
}

enum CountScan {
    Count(usize),
    /// A leading '0' with no preceding digit: the line-start motion.
    BareZero,
}

fn scan_count(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> CountScan {
    if chars.peek() == Some(&'0') {
        chars.next();
        return CountScan::BareZero;
    }
    let mut count: usize = 0;
    let mut seen = false;
    while let Some(c) = chars.peek() {
        match c.to_digit(10) {
            Some(d) => {
                count = count.saturating_mul(10).saturating_add(d as usize);
                seen = true;
                chars.next();
            }
            None => break,
        }
    }
    CountScan::Count(if seen { count } else { 1 })
}

fn operator_for(c: char) -> Option<Operator> {
    match c {
        'd' => Some(Operator::Delete),
        'c' => Some(Operator::Change),
        'y' => Some(Operator::Yank),
        _ => None,
    }
}

// Motions are at most two keys deep ('g' prefix); the parse result reuses
// ParsedCommand as a carrier so operator rules can share it.
fn motion_for(head: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Parse {
    let motion = match head {
        'h' => Motion::Left,
        'l' => Motion::Right,
        'k' => Motion::Up,
        'j' => Motion::Down,
        'w' => Motion::WordForward,
        'b' => Motion::WordBack,
        'e' => Motion::WordEnd,
        // '0' is consumed by the count scanner before motions are tried
        '$' => Motion::LineEnd,
        'G' => Motion::LastLine,
        'g' => {
            return match chars.next() {
                None => Parse::Pending,
                Some('g') => Parse::Complete(ParsedCommand::new(1, CommandKind::Move(Motion::FirstLine))),
                Some(_) => Parse::Unrecognized,
            }
        }
        _ => return Parse::Unrecognized,
    };
    Parse::Complete(ParsedCommand::new(1, CommandKind::Move(motion)))
}

fn motion_of(cmd: ParsedCommand) -> Motion {
    match cmd.kind {
        CommandKind::Move(m) => m,
        _ => unreachable!("motion carrier always holds a Move"),
    }
}

// A completion with keys left over means the sequence ran past a terminal
// rule, which the incremental re-parse never produces; treat it as garbage.
fn complete(count: usize, kind: CommandKind, mut rest: std::iter::Peekable<std::str::Chars<'_>>) -> Parse {
    if rest.peek().is_some() {
        return Parse::Unrecognized;
    }
    Parse::Complete(ParsedCommand::new(count, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> ParsedCommand {
        match parse(Mode::Normal, raw) {
            Parse::Complete(cmd) => cmd,
            other => panic!("expected complete parse for {:?}, got {:?}", raw, other),
        }
    }

    #[test]
    fn test_count_operator_motion() {
        let cmd = parsed("3dw");
        assert_eq!(cmd.count, 3);
        assert_eq!(
            cmd.kind,
            CommandKind::Operate { operator: Operator::Delete, motion: Motion::WordForward }
        );
    }

    #[test]
    fn test_counts_multiply() {
        let cmd = parsed("3d2w");
        assert_eq!(cmd.count, 6);
    }

    #[test]
    fn test_doubled_operator_is_linewise() {
        let cmd = parsed("2dd");
        assert_eq!(cmd.count, 2);
        assert_eq!(
            cmd.kind,
            CommandKind::Operate { operator: Operator::Delete, motion: Motion::CurrentLine }
        );
        assert_eq!(
            parsed("yy").kind,
            CommandKind::Operate { operator: Operator::Yank, motion: Motion::CurrentLine }
        );
    }

    #[test]
    fn test_bare_zero_is_line_start() {
        assert_eq!(parsed("0").kind, CommandKind::Move(Motion::LineStart));
        // ...but a zero inside a count is a count digit
        let cmd = parsed("10j");
        assert_eq!(cmd.count, 10);
        assert_eq!(cmd.kind, CommandKind::Move(Motion::Down));
    }

    #[test]
    fn test_count_alone_stays_pending() {
        assert_eq!(parse(Mode::Normal, "3"), Parse::Pending);
        assert_eq!(parse(Mode::Normal, "42"), Parse::Pending);
    }

    #[test]
    fn test_operator_alone_stays_pending() {
        assert_eq!(parse(Mode::Normal, "d"), Parse::Pending);
        assert_eq!(parse(Mode::Normal, "3d"), Parse::Pending);
        assert_eq!(parse(Mode::Normal, "d2"), Parse::Pending);
        assert_eq!(parse(Mode::Normal, "g"), Parse::Pending);
        assert_eq!(parse(Mode::Normal, "dg"), Parse::Pending);
    }

    #[test]
    fn test_g_prefix() {
        assert_eq!(parsed("gg").kind, CommandKind::Move(Motion::FirstLine));
        assert_eq!(
            parsed("dgg").kind,
            CommandKind::Operate { operator: Operator::Delete, motion: Motion::FirstLine }
        );
        assert_eq!(parse(Mode::Normal, "gx"), Parse::Unrecognized);
    }

    #[test]
    fn test_unrecognized_sequences() {
        assert_eq!(parse(Mode::Normal, "z"), Parse::Unrecognized);
        assert_eq!(parse(Mode::Normal, "dq"), Parse::Unrecognized);
        assert_eq!(parse(Mode::Normal, "3q"), Parse::Unrecognized);
    }

    #[test]
    fn test_mode_entries() {
        assert_eq!(parsed("i").kind, CommandKind::EnterInsert(InsertEntry::Before));
        assert_eq!(parsed("O").kind, CommandKind::EnterInsert(InsertEntry::LineAbove));
        assert_eq!(parsed("v").kind, CommandKind::EnterVisual);
        assert_eq!(parsed("R").kind, CommandKind::EnterReplacing);
        assert_eq!(parsed(":").kind, CommandKind::EnterCommandLine);
        assert_eq!(parsed("/").kind, CommandKind::EnterSearch);
    }

    #[test]
    fn test_visual_grammar() {
        match parse(Mode::Visual, "d") {
            Parse::Complete(cmd) => {
                assert_eq!(cmd.kind, CommandKind::OperateSelection(Operator::Delete))
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse(Mode::Visual, "3w") {
            Parse::Complete(cmd) => {
                assert_eq!(cmd.count, 3);
                assert_eq!(cmd.kind, CommandKind::Move(Motion::WordForward));
            }
            other => panic!("unexpected {:?}", other),
        }
        // operators never take a motion in visual mode
        assert_eq!(parse(Mode::Visual, "i"), Parse::Unrecognized);
    }

    #[test]
    fn test_replacing_grammar() {
        assert_eq!(
            parse(Mode::Replacing, "q"),
            Parse::Complete(ParsedCommand::new(1, CommandKind::ReplaceChar('q')))
        );
        // preserved prefix keys are ignored; the newest key is the command
        assert_eq!(
            parse(Mode::Replacing, "Rx"),
            Parse::Complete(ParsedCommand::new(1, CommandKind::ReplaceChar('x')))
        );
        assert_eq!(parse(Mode::Replacing, ""), Parse::Pending);
    }

    #[test]
    fn test_line_modes_never_complete() {
        assert_eq!(parse(Mode::Command, "wq"), Parse::Pending);
        assert_eq!(parse(Mode::Search, "needle"), Parse::Pending);
    }
}
