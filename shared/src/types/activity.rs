//! Device activity record types
//!
//! These types mirror the fixed-layout records the tracing backend delivers
//! in its activity buffers. The tracer reads them, it never mutates them.

use serde::{Deserialize, Serialize};

/// Correlation identifier assigned by the backend to one host API invocation.
///
/// Unique only while that invocation's device work is pending; the backend
/// reuses ids over the process lifetime.
pub type CorrelationId = u64;

/// Numeric id of an intercepted host API call.
pub type ApiCallId = u32;

/// Backend classification of an event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Host-side runtime API calls (callback domain).
    HipApi,
    /// Device operations issued through the runtime API.
    HipOps,
    /// Device operations issued through the underlying compute runtime.
    HccOps,
}

impl Domain {
    /// Whether records in this domain describe completed device operations.
    pub fn is_device_op(self) -> bool {
        matches!(self, Domain::HipOps | Domain::HccOps)
    }
}

/// Operation ids used within the device-operation domains.
pub mod op_id {
    pub const DISPATCH: u32 = 0;
    pub const COPY: u32 = 1;
    pub const BARRIER: u32 = 2;
}

/// One completed device operation as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub domain: Domain,
    pub op: u32,
    pub kind: u32,
    pub correlation_id: CorrelationId,
    /// Start timestamp in nanoseconds.
    pub begin_ns: u64,
    /// End timestamp in nanoseconds. Not validated against `begin_ns`.
    pub end_ns: u64,
    pub device_id: u64,
    pub queue_id: u64,
    /// Transfer size. Only meaningful for copy operations.
    pub bytes: u64,
}

impl ActivityRecord {
    pub fn is_copy(&self) -> bool {
        self.op == op_id::COPY
    }
}
