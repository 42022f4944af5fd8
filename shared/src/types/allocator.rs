//! Allocator statistics types

use serde::{Deserialize, Serialize};

/// Point-in-time statistics for one named memory allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStats {
    /// Bytes currently handed out to the application.
    pub current_size: u64,

    /// Bytes actually reserved by the allocator (including pool slack).
    pub actual_size: u64,

    /// Largest `current_size` observed so far.
    pub high_watermark: u64,

    /// Number of live allocations.
    pub allocation_count: u64,
}
