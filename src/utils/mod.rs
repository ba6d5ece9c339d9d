//! Shared utility functions.

mod string;

pub use string::{short_id, truncate_with_marker};
