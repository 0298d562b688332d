//! Shared types for TaskPilot.
//!
//! Tasks and their drafts, the request/response shapes exchanged with AI
//! providers, and locally computed task statistics.

pub mod ai;
pub mod datetime;
pub mod stats;
pub mod task;

pub use ai::*;
pub use stats::*;
pub use task::*;
