// src/ui/mod.rs
mod renderer;

pub use renderer::Renderer;
