//! Report rendering (text and JSON) and persistence.

pub mod format;
pub mod persist;
pub mod render;
