// src/main.rs
use std::{
    io::{self, stdout},
    path::{Path, PathBuf},
};
use crossterm::{
    cursor::SetCursorStyle,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{enable_raw_mode, disable_raw_mode},
    ExecutableCommand,
};
use clap::Parser;

mod ui;

use ui::Renderer;
use vimode::surface::{ScratchHandle, TextSurface};
use vimode::{CaretStyle, HostSignal, LifecycleAction, RouteDecision, VimConfig, VimRouter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to preload into the scratch surface
    #[arg(name = "FILE")]
    file: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    if let Ok(log_path) = std::env::var("VIMODE_LOG") {
        simple_logging::log_to_file(
            log_path,
            log::LevelFilter::Debug,
        ).expect("Failed to initialize logging");
    }

    // Load configuration
    let config = match &args.config {
        Some(path) => VimConfig::load_from_file(path),
        None => VimConfig::load(),
    }.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        VimConfig::default()
    });

    // Build the scratch surface the engine will drive
    let surface = match &args.file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => ScratchHandle::from_text(&text),
            Err(e) => {
                eprintln!("Error opening file: {}", e);
                return Ok(());
            }
        },
        None => ScratchHandle::from_text(""),
    };

    // Bind the router to the surface, as a host would on focus
    let mut router = VimRouter::with_config(&config);
    router.on_surface_focused(Box::new(surface.clone()));

    // Initialize renderer
    let mut renderer = Renderer::new()?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(crossterm::terminal::EnterAlternateScreen)?;

    // Main event loop
    let result = run_event_loop(&mut router, &surface, &mut renderer, args.file.as_deref());

    // Cleanup
    cleanup()?;

    result
}

fn run_event_loop(
    router: &mut VimRouter,
    surface: &ScratchHandle,
    renderer: &mut Renderer,
    save_path: Option<&Path>,
) -> io::Result<()> {
    let mut status = String::new();
    for signal in router.drain_signals() {
        apply_signal(signal, surface, save_path, &mut status)?;
    }

    loop {
        renderer.render(&surface.text(), surface.cursor_position(), &status)?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // escape hatch so a broken config can't trap the terminal
                if key.matches_ctrl_key('q') {
                    break;
                }

                let decision = route_key(router, key);
                if decision == RouteDecision::PassThrough {
                    apply_host_default(surface, key);
                }

                for signal in router.drain_signals() {
                    if apply_signal(signal, surface, save_path, &mut status)? {
                        return Ok(());
                    }
                }
            }
            Event::Resize(..) => {
                // next draw picks up the new size
            }
            _ => {}
        }
    }

    Ok(())
}

fn route_key(router: &mut VimRouter, key: KeyEvent) -> RouteDecision {
    match key.code {
        KeyCode::Char(c) => router.on_char(c, key.modifiers),
        _ => router.on_key_down(key),
    }
}

// The "default key handling" a real editor widget would do itself.
fn apply_host_default(surface: &ScratchHandle, key: KeyEvent) {
    let mut surface = surface.clone();
    let at = surface.cursor_position();
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            surface.insert_text(at, &c.to_string());
        }
        KeyCode::Enter => {
            surface.insert_text(at, "\n");
        }
        KeyCode::Backspace => {
            if at > 0 {
                surface.delete_range(at - 1, at);
            }
        }
        KeyCode::Left => surface.set_cursor_position(at.saturating_sub(1)),
        KeyCode::Right => surface.set_cursor_position(at + 1),
        _ => {}
    }
}

/// Returns true when the editor should close.
fn apply_signal(
    signal: HostSignal,
    surface: &ScratchHandle,
    save_path: Option<&Path>,
    status: &mut String,
) -> io::Result<bool> {
    match signal {
        HostSignal::StatusMessage(text) => *status = text,
        HostSignal::CaretStyle(style) => {
            let shape = match style {
                CaretStyle::Block => SetCursorStyle::SteadyBlock,
                CaretStyle::Bar => SetCursorStyle::SteadyBar,
            };
            stdout().execute(shape)?;
        }
        HostSignal::Lifecycle(action) => match action {
            LifecycleAction::SaveEditor => save_surface(surface, save_path, status),
            LifecycleAction::CloseEditor => return Ok(true),
            LifecycleAction::SaveAndClose => {
                save_surface(surface, save_path, status);
                return Ok(true);
            }
            LifecycleAction::None => {}
        },
    }
    Ok(false)
}

fn save_surface(surface: &ScratchHandle, path: Option<&Path>, status: &mut String) {
    match path {
        Some(path) => match std::fs::write(path, surface.text()) {
            Ok(()) => *status = format!("\"{}\" written", path.display()),
            Err(e) => *status = format!("Error writing \"{}\": {}", path.display(), e),
        },
        None => *status = "No file name".to_string(),
    }
}

fn cleanup() -> io::Result<()> {
    stdout().execute(SetCursorStyle::DefaultUserShape)?;
    disable_raw_mode()?;
    stdout().execute(crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

trait KeyEventExt {
    fn matches_ctrl_key(&self, c: char) -> bool;
}

impl KeyEventExt for KeyEvent {
    fn matches_ctrl_key(&self, c: char) -> bool {
        matches!(
            (self.modifiers, self.code),
            (KeyModifiers::CONTROL, KeyCode::Char(k)) if k == c
        )
    }
}
