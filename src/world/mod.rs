//! World module - obstacles agents see around and hide behind.

mod geometry;

pub use geometry::{spawn_pillar, spawn_wall, ObstacleMarker, PILLAR_SIZE};
