//! Shared types and utilities for roclens
//!
//! This crate contains common data structures, types, and utilities used across
//! the tracer library and any host integrations built on top of it.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{activity::*, allocator::*};
