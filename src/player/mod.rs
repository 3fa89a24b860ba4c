//! Player module - the entity agents perceive and attack.

mod components;
mod spawning;

pub use components::*;
pub use spawning::spawn_player;
