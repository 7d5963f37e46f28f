//! Human-readable output.

pub mod wrapping;
