//! GPU activity tracing and host-call correlation
//!
//! This library intercepts host-side GPU API calls, buffers asynchronously
//! delivered device activity records, and reconstructs which host call site
//! (and, optionally, which kernel) launched each device-side operation.
//! The instrumentation framework that owns attributes, region trees, and
//! record output, and the vendor tracing backend that delivers callbacks and
//! activity buffers, are both consumed through narrow trait interfaces.

pub mod allocator;
pub mod attributes;
pub mod backend;
pub mod config;
pub mod correlation;
pub mod flush;
pub mod framework;
pub mod interceptor;
pub mod service;
pub mod stats;

pub use config::TracerConfig;
pub use service::TraceService;
