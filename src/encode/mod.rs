//! Video encoding: the engine seam, its resources, and the lazily loaded session.

pub mod engine;
pub mod ffmpeg;
pub mod resources;
pub mod session;
