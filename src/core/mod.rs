//! Core module - shared events, ground-plane geometry and smoothing helpers.

mod events;
pub mod geometry;
mod plugin;
pub mod tween;

pub use events::*;
pub use plugin::CorePlugin;
