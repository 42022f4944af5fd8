//! Type definitions shared across roclens crates

pub mod activity;
pub mod allocator;
