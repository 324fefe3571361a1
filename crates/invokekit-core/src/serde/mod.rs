//! Serde helpers shared by configuration types.

pub mod duration_ms;
