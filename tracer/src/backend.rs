//! Interface to the vendor tracing backend
//!
//! The backend owns host-call interception and device activity buffering.
//! Callbacks are registered as closures; the backend invokes the API
//! callback synchronously on the calling thread and the buffer callback
//! from whatever thread it flushes on.

use std::sync::Arc;

use roclens_shared::types::activity::{ActivityRecord, ApiCallId, CorrelationId, Domain};
use thiserror::Error;

/// Error reported by a failed backend call, carrying the backend's own
/// error string.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Phase flag delivered with each host-call callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPhase {
    Enter,
    Exit,
}

/// How a kernel-launch call identifies its target kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelLaunch {
    /// Launch by host function pointer, relative to the stream it targets.
    ByFunction { function: u64, stream: u64 },
    /// Launch by module-level kernel handle.
    ByModuleHandle { handle: u64 },
}

/// Data delivered with each intercepted host API call.
#[derive(Debug, Clone)]
pub struct ApiCallbackData {
    pub call_id: ApiCallId,
    pub phase: ApiPhase,
    pub correlation_id: CorrelationId,

    /// Present when the call is a recognized kernel-launch variant.
    pub launch: Option<KernelLaunch>,
}

/// Handle to an open activity trace pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHandle(pub u64);

/// Callback invoked on entry and exit of each intercepted host API call.
pub type ApiCallback = Arc<dyn Fn(&ApiCallbackData) + Send + Sync>;

/// Callback invoked with a full (or explicitly flushed) activity buffer.
pub type BufferCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// The tracing backend surface consumed by roclens.
pub trait TraceBackend: Send + Sync {
    /// Start delivering host-call callbacks for `domain`.
    fn enable_api_callbacks(&self, domain: Domain, callback: ApiCallback)
        -> Result<(), BackendError>;

    /// Stop delivering host-call callbacks for `domain`.
    fn disable_api_callbacks(&self, domain: Domain) -> Result<(), BackendError>;

    /// Open a buffered trace pool. `callback` receives each completed
    /// buffer, possibly on a backend-internal thread.
    fn open_pool(&self, buffer_size: usize, callback: BufferCallback)
        -> Result<PoolHandle, BackendError>;

    /// Close a trace pool. May still deliver pending buffers first.
    fn close_pool(&self, pool: PoolHandle) -> Result<(), BackendError>;

    /// Start recording activity for `domain` into `pool`.
    fn enable_activity_domain(&self, domain: Domain, pool: PoolHandle)
        -> Result<(), BackendError>;

    /// Stop recording activity for `domain`.
    fn disable_activity_domain(&self, domain: Domain) -> Result<(), BackendError>;

    /// Deliver buffered-but-undelivered records synchronously before
    /// returning.
    fn flush_activity(&self, pool: PoolHandle) -> Result<(), BackendError>;

    /// Display string for an operation id.
    fn op_string(&self, domain: Domain, op: u32, kind: u32) -> String;

    /// Raw (mangled) symbol name of a launched kernel, if the backend can
    /// resolve it.
    fn kernel_symbol(&self, launch: &KernelLaunch) -> Option<String>;

    /// True for the backend's internal call-configuration bookkeeping ids,
    /// which must not be traced as API regions.
    fn is_call_config(&self, call_id: ApiCallId) -> bool;

    /// Decode activity records from a delivered buffer, lazily. The
    /// iterator stops at the end of the range or when the backend cannot
    /// step to a further record; it is not restartable.
    fn records<'buf>(&self, buffer: &'buf [u8]) -> Box<dyn Iterator<Item = ActivityRecord> + 'buf>;
}
