// src/engine/mode.rs

/// The modal states of the emulation layer. Exactly one mode is active per
/// bound surface; transitions are driven by the dispatcher and the router's
/// escape/return handling, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Command,
    Visual,
    Search,
    Replacing,
}

impl Mode {
    pub fn default() -> Self {
        Mode::Normal
    }

    /// Caret rendering hint for the host surface.
    pub fn caret_style(&self) -> CaretStyle {
        match self {
            Mode::Normal | Mode::Command | Mode::Visual => CaretStyle::Block,
            _ => CaretStyle::Bar,
        }
    }

    /// Human-readable label for the status line. Command and Search modes
    /// display the in-progress line instead of a fixed label.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::Replacing => "REPLACE",
            Mode::Command | Mode::Search => "",
        }
    }

    /// Prefix echoed before the accumulated line while it is being typed.
    pub fn line_prefix(&self) -> &'static str {
        match self {
            Mode::Command => ":",
            Mode::Search => "/",
            _ => "",
        }
    }

    // Plain printable characters are document text rather than command input
    // in these modes.
    pub fn takes_text_input(&self) -> bool {
        matches!(self, Mode::Insert)
    }

    /// Modes whose keystrokes accumulate into a line executed on Return.
    pub fn is_line_mode(&self) -> bool {
        matches!(self, Mode::Command | Mode::Search)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretStyle {
    Block,
    Bar,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_styles() {
        assert_eq!(Mode::Normal.caret_style(), CaretStyle::Block);
        assert_eq!(Mode::Command.caret_style(), CaretStyle::Block);
        assert_eq!(Mode::Visual.caret_style(), CaretStyle::Block);
        assert_eq!(Mode::Insert.caret_style(), CaretStyle::Bar);
        assert_eq!(Mode::Search.caret_style(), CaretStyle::Bar);
        assert_eq!(Mode::Replacing.caret_style(), CaretStyle::Bar);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Mode::Normal.label(), "NORMAL");
        assert_eq!(Mode::Insert.label(), "INSERT");
        assert_eq!(Mode::Replacing.label(), "REPLACE");
        assert_eq!(Mode::Command.label(), "");
    }

    #[test]
    fn test_line_prefixes() {
        assert_eq!(Mode::Command.line_prefix(), ":");
        assert_eq!(Mode::Search.line_prefix(), "/");
        assert_eq!(Mode::Normal.line_prefix(), "");
    }

    #[test]
    fn test_text_input_permissions() {
        assert!(Mode::Insert.takes_text_input());
        assert!(!Mode::Normal.takes_text_input());
        assert!(!Mode::Command.takes_text_input());
        assert!(Mode::Command.is_line_mode());
        assert!(Mode::Search.is_line_mode());
        assert!(!Mode::Visual.is_line_mode());
    }
}
