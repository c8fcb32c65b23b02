//! Hand-gesture control core.
//!
//! Turns per-frame hand-landmark snapshots into one debounced gesture per
//! frame across four categories (action, movement, camera, navigation).

pub mod config;
pub mod engine;
pub mod gesture;
pub mod hand;
pub mod ipc;
pub mod timing;

pub use config::EngineConfig;
pub use engine::{FrameReport, GestureEngine};
