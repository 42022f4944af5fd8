//! Host-call interceptor
//!
//! Runs synchronously inside every intercepted host API call. On entry it
//! opens a region named after the call and, when tracing, records the
//! current context (optionally extended with the launched kernel's
//! demangled name) under the call's correlation id. On exit it closes the
//! region. The matching device activity arrives later, through the flusher.

use std::sync::Arc;

use roclens_shared::types::activity::Domain;
use roclens_shared::utils::demangle::demangle;

use crate::attributes::TraceAttributes;
use crate::backend::{ApiCallbackData, ApiPhase, TraceBackend};
use crate::correlation::CorrelationStore;
use crate::framework::Instrumentation;
use crate::stats::TraceStats;

pub struct ApiInterceptor {
    framework: Arc<dyn Instrumentation>,
    backend: Arc<dyn TraceBackend>,
    store: Arc<CorrelationStore>,
    stats: Arc<TraceStats>,
    attrs: TraceAttributes,
    enable_tracing: bool,
    record_kernel_names: bool,
}

impl ApiInterceptor {
    pub fn new(
        framework: Arc<dyn Instrumentation>,
        backend: Arc<dyn TraceBackend>,
        store: Arc<CorrelationStore>,
        stats: Arc<TraceStats>,
        attrs: TraceAttributes,
        enable_tracing: bool,
        record_kernel_names: bool,
    ) -> Self {
        Self {
            framework,
            backend,
            store,
            stats,
            attrs,
            enable_tracing,
            record_kernel_names,
        }
    }

    /// Handle one host-call callback (both phases).
    pub fn handle(&self, data: &ApiCallbackData) {
        // Call-configuration bookkeeping calls carry no useful context
        if self.backend.is_call_config(data.call_id) {
            return;
        }

        match data.phase {
            ApiPhase::Enter => self.on_enter(data),
            ApiPhase::Exit => self.framework.end_region(self.attrs.api),
        }
    }

    fn on_enter(&self, data: &ApiCallbackData) {
        let call_name = self.backend.op_string(Domain::HipApi, data.call_id, 0);
        self.framework.begin_region(self.attrs.api, &call_name);

        if !self.enable_tracing {
            return;
        }

        // When tracing, remember the current context under this call's
        // correlation id so the flusher can attach device activity to it.
        let mut kernel = String::new();
        if self.record_kernel_names {
            if let Some(launch) = &data.launch {
                kernel = self.backend.kernel_symbol(launch).unwrap_or_default();
            }
        }

        let mut node = self.framework.current_node(self.attrs.api);
        if !kernel.is_empty() {
            let demangled = demangle(&kernel);
            node = Some(
                self.framework
                    .make_tree_entry(self.attrs.kernel_name, &demangled, node),
            );
        }

        if let Some(node) = node {
            self.store.store(data.correlation_id, node);
            self.stats.correlation_stored();
        }
    }
}
