// src/lib.rs
//! Vim-style modal editing engine for embedding in text-editing widgets.
//!
//! The host feeds raw key and focus events into a [`input::VimRouter`]; the
//! engine interprets them against the active mode and applies the resulting
//! edits through the [`surface::TextSurface`] capability the host provides.
//! Outbound effects (status text, caret shape, deferred save/close requests)
//! come back through a signal queue the host drains after each event.

pub mod config;
pub mod engine;
pub mod input;
pub mod surface;

pub use config::VimConfig;
pub use engine::{CaretStyle, DispatchResult, EditAction, LifecycleAction, Mode, RouteDecision};
pub use input::{HostSignal, VimRouter};
pub use surface::TextSurface;
