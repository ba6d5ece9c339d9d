//! Structured output for CLI results.
//!
//! - `OutputWriter`: Formats results as human-readable text or JSON

mod writer;

pub use writer::OutputWriter;
