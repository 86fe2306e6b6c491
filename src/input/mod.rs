// src/input/mod.rs
pub mod router;

pub use router::{HostSignal, VimRouter};
