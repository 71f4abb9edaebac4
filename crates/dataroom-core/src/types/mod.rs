//! Core type definitions used across the DataRoom workspace.

pub mod id;
pub mod time;

pub use id::*;
pub use time::{Millis, now_millis, to_datetime};
