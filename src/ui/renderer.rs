// src/ui/renderer.rs
use std::io::{self, Stdout};

use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Terminal,
};

/// Full-redraw renderer for the demo host: the scratch text on top, a one
/// line status bar underneath. The engine never sees this; rendering is the
/// host's job.
pub struct Renderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Renderer {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn render(&mut self, text: &str, cursor: usize, status: &str) -> io::Result<()> {
        let (row, col) = cursor_row_col(text, cursor);
        let body = text.to_string();
        let status_line = status.to_string();

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(frame.size());

            frame.render_widget(Paragraph::new(body), chunks[0]);
            frame.render_widget(
                Paragraph::new(status_line)
                    .style(Style::default().fg(Color::Black).bg(Color::Gray)),
                chunks[1],
            );

            let area = chunks[0];
            let x = area.x + (col as u16).min(area.width.saturating_sub(1));
            let y = area.y + (row as u16).min(area.height.saturating_sub(1));
            frame.set_cursor(x, y);
        })?;
        Ok(())
    }
}

fn cursor_row_col(text: &str, cursor: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for (i, c) in text.chars().enumerate() {
        if i == cursor {
            break;
        }
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}
