//! Activity buffer flusher
//!
//! Invoked by the backend with a raw buffer of activity records, possibly
//! on a backend-internal thread and long after the originating host calls
//! returned. Walks the buffer through the backend's record iterator and
//! emits one profiling record per device operation, attached under the
//! correlated host context when one is found.

use std::sync::Arc;

use tracing::debug;

use roclens_shared::types::activity::ActivityRecord;

use crate::attributes::TraceAttributes;
use crate::backend::TraceBackend;
use crate::correlation::CorrelationStore;
use crate::framework::{AttrValue, Instrumentation};
use crate::stats::TraceStats;

pub struct ActivityFlusher {
    framework: Arc<dyn Instrumentation>,
    backend: Arc<dyn TraceBackend>,
    store: Arc<CorrelationStore>,
    stats: Arc<TraceStats>,
    attrs: TraceAttributes,
}

impl ActivityFlusher {
    pub fn new(
        framework: Arc<dyn Instrumentation>,
        backend: Arc<dyn TraceBackend>,
        store: Arc<CorrelationStore>,
        stats: Arc<TraceStats>,
        attrs: TraceAttributes,
    ) -> Self {
        Self {
            framework,
            backend,
            store,
            stats,
            attrs,
        }
    }

    /// Process one delivered activity buffer.
    pub fn flush(&self, buffer: &[u8]) {
        self.framework
            .begin_region(self.attrs.flush_region, "ACTIVITY FLUSH");

        let mut num_records: u64 = 0;
        let mut num_flushed: u64 = 0;

        for record in self.backend.records(buffer) {
            num_records += 1;
            num_flushed += self.flush_record(&record);
        }

        debug!(
            "roclens: flushed {} records ({} emitted, {} skipped)",
            num_records,
            num_flushed,
            num_records - num_flushed
        );

        self.stats.add_records_seen(num_records);
        self.stats.add_records_flushed(num_flushed);
        self.stats.flush_done();

        self.framework.end_region(self.attrs.flush_region);
    }

    /// Emit one record if it describes a device operation. Returns the
    /// number of records emitted (0 or 1).
    fn flush_record(&self, record: &ActivityRecord) -> u64 {
        if !record.domain.is_device_op() {
            return 0;
        }

        // Take outside of record construction: the store's lock must never
        // be held across emission.
        let parent = self.store.take(record.correlation_id);
        if parent.is_some() {
            self.stats.correlation_found();
        } else {
            self.stats.correlation_missed();
        }

        let name = self
            .backend
            .op_string(record.domain, record.op, record.kind);

        // end < begin would be a backend anomaly; the difference is passed
        // through unvalidated either way.
        let duration = record.end_ns.wrapping_sub(record.begin_ns);

        let mut fields = vec![
            (self.attrs.activity_name, AttrValue::Str(name)),
            (self.attrs.activity_start, AttrValue::Uint(record.begin_ns)),
            (self.attrs.activity_end, AttrValue::Uint(record.end_ns)),
            (self.attrs.activity_duration, AttrValue::Uint(duration)),
            (self.attrs.activity_device, AttrValue::Uint(record.device_id)),
            (self.attrs.activity_queue, AttrValue::Uint(record.queue_id)),
        ];

        if record.is_copy() {
            fields.push((self.attrs.activity_bytes, AttrValue::Uint(record.bytes)));
        }

        self.framework.emit_record(&fields, parent);

        1
    }
}
