//! Mock instrumentation framework and tracing backend for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use roclens_shared::types::activity::{op_id, ActivityRecord, ApiCallId, Domain};
use roclens_tracer::backend::{
    ApiCallback, ApiCallbackData, ApiPhase, BackendError, BufferCallback, KernelLaunch,
    PoolHandle, TraceBackend,
};
use roclens_tracer::framework::{
    AttrProperties, AttrType, AttrValue, Attribute, EventHandler, Instrumentation, LifecycleEvent,
    NodeId,
};

// Host API call ids understood by the mock backend
pub const CALL_ID_LAUNCH_KERNEL: ApiCallId = 10;
pub const CALL_ID_MODULE_LAUNCH_KERNEL: ApiCallId = 11;
pub const CALL_ID_MEMCPY: ApiCallId = 20;
pub const CALL_ID_PUSH_CALL_CONFIG: ApiCallId = 98;
pub const CALL_ID_POP_CALL_CONFIG: ApiCallId = 99;

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub attr: Attribute,
    pub value: String,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct EmittedRecord {
    pub fields: Vec<(Attribute, AttrValue)>,
    pub parent: Option<NodeId>,
}

impl EmittedRecord {
    pub fn value_of(&self, attr: Attribute) -> Option<&AttrValue> {
        self.fields.iter().find(|(a, _)| *a == attr).map(|(_, v)| v)
    }

    pub fn has(&self, attr: Attribute) -> bool {
        self.value_of(attr).is_some()
    }
}

type Handler = Arc<dyn Fn() + Send + Sync>;

/// In-memory stand-in for the instrumentation framework: records every
/// attribute, tree node, region transition, and emitted record.
#[derive(Default)]
pub struct RecordingFramework {
    attrs: Mutex<Vec<String>>,
    nodes: Mutex<Vec<TreeNode>>,
    stack: Mutex<Vec<(Attribute, NodeId)>>,
    records: Mutex<Vec<EmittedRecord>>,
    handlers: Mutex<Vec<(LifecycleEvent, Handler)>>,
}

/// Route tracer logs through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

impl RecordingFramework {
    pub fn new() -> Arc<Self> {
        init_logging();
        Arc::new(Self::default())
    }

    /// Fire a lifecycle event to every handler subscribed so far.
    pub fn fire(&self, event: LifecycleEvent) {
        let handlers: Vec<Handler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn attr_by_name(&self, name: &str) -> Option<Attribute> {
        self.attrs
            .lock()
            .unwrap()
            .iter()
            .position(|n| n == name)
            .map(|i| Attribute(i as u32))
    }

    pub fn node(&self, id: NodeId) -> TreeNode {
        self.nodes.lock().unwrap()[id.0 as usize].clone()
    }

    pub fn emitted(&self) -> Vec<EmittedRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Node of the innermost open region for `attr`; panics if none is open.
    pub fn current_node_of(&self, attr: Attribute) -> NodeId {
        self.stack
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(a, _)| *a == attr)
            .map(|(_, n)| *n)
            .expect("no open region for attribute")
    }

    pub fn open_regions(&self, attr: Attribute) -> usize {
        self.stack
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == attr)
            .count()
    }

    fn push_node(&self, node: TreeNode) -> NodeId {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.push(node);
        NodeId((nodes.len() - 1) as u64)
    }
}

impl Instrumentation for RecordingFramework {
    fn create_attribute(&self, name: &str, _ty: AttrType, _props: AttrProperties) -> Attribute {
        let mut attrs = self.attrs.lock().unwrap();
        attrs.push(name.to_string());
        Attribute((attrs.len() - 1) as u32)
    }

    fn begin_region(&self, attr: Attribute, value: &str) {
        let parent = self.stack.lock().unwrap().last().map(|(_, n)| *n);
        let id = self.push_node(TreeNode {
            attr,
            value: value.to_string(),
            parent,
        });
        self.stack.lock().unwrap().push((attr, id));
    }

    fn end_region(&self, attr: Attribute) {
        let mut stack = self.stack.lock().unwrap();
        if let Some(pos) = stack.iter().rposition(|(a, _)| *a == attr) {
            stack.remove(pos);
        }
    }

    fn current_node(&self, attr: Attribute) -> Option<NodeId> {
        self.stack
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(a, _)| *a == attr)
            .map(|(_, n)| *n)
    }

    fn make_tree_entry(&self, attr: Attribute, value: &str, parent: Option<NodeId>) -> NodeId {
        self.push_node(TreeNode {
            attr,
            value: value.to_string(),
            parent,
        })
    }

    fn emit_record(&self, fields: &[(Attribute, AttrValue)], parent: Option<NodeId>) {
        self.records.lock().unwrap().push(EmittedRecord {
            fields: fields.to_vec(),
            parent,
        });
    }

    fn subscribe(&self, event: LifecycleEvent, handler: EventHandler) {
        self.handlers.lock().unwrap().push((event, Arc::from(handler)));
    }
}

/// Scriptable stand-in for the tracing backend. Buffers are bincode-encoded
/// record vectors; delivery happens synchronously through the registered
/// buffer callback, just like a backend flushing on its own thread would.
#[derive(Default)]
pub struct MockBackend {
    api_callback: Mutex<Option<ApiCallback>>,
    buffer_callback: Mutex<Option<BufferCallback>>,
    pub callbacks_enabled: AtomicBool,
    pub pool_open: AtomicBool,
    pub explicit_flushes: AtomicU64,
    pub fail_open_pool: AtomicBool,
    active_domains: Mutex<Vec<Domain>>,
    kernel_symbols: Mutex<HashMap<u64, String>>,
    pending: Mutex<Vec<ActivityRecord>>,
    ops: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_kernel_symbol(&self, key: u64, symbol: &str) {
        self.kernel_symbols
            .lock()
            .unwrap()
            .insert(key, symbol.to_string());
    }

    /// Invoke the registered host-call callback, as the runtime would.
    pub fn api_call(&self, data: &ApiCallbackData) {
        let callback = self.api_callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            if self.callbacks_enabled.load(Ordering::SeqCst) {
                callback(data);
            }
        }
    }

    /// Deliver a full activity buffer through the registered callback.
    pub fn deliver(&self, records: &[ActivityRecord]) {
        let buffer = encode_records(records);
        let callback = self.buffer_callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(&buffer);
        }
    }

    /// Queue records as buffered-but-undelivered; they go out on the next
    /// explicit flush.
    pub fn buffer_pending(&self, records: &[ActivityRecord]) {
        self.pending.lock().unwrap().extend_from_slice(records);
    }

    pub fn domains(&self) -> Vec<Domain> {
        self.active_domains.lock().unwrap().clone()
    }

    pub fn op_log(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn log(&self, op: &str) {
        self.ops.lock().unwrap().push(op.to_string());
    }
}

pub fn encode_records(records: &[ActivityRecord]) -> Vec<u8> {
    bincode::serialize(&records.to_vec()).unwrap()
}

impl TraceBackend for MockBackend {
    fn enable_api_callbacks(
        &self,
        _domain: Domain,
        callback: ApiCallback,
    ) -> Result<(), BackendError> {
        self.log("enable_api_callbacks");
        *self.api_callback.lock().unwrap() = Some(callback);
        self.callbacks_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_api_callbacks(&self, _domain: Domain) -> Result<(), BackendError> {
        self.log("disable_api_callbacks");
        self.callbacks_enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn open_pool(
        &self,
        _buffer_size: usize,
        callback: BufferCallback,
    ) -> Result<PoolHandle, BackendError> {
        self.log("open_pool");
        if self.fail_open_pool.load(Ordering::SeqCst) {
            return Err(BackendError("out of resources".into()));
        }
        *self.buffer_callback.lock().unwrap() = Some(callback);
        self.pool_open.store(true, Ordering::SeqCst);
        Ok(PoolHandle(1))
    }

    fn close_pool(&self, _pool: PoolHandle) -> Result<(), BackendError> {
        self.log("close_pool");
        self.pool_open.store(false, Ordering::SeqCst);
        *self.buffer_callback.lock().unwrap() = None;
        Ok(())
    }

    fn enable_activity_domain(
        &self,
        domain: Domain,
        _pool: PoolHandle,
    ) -> Result<(), BackendError> {
        self.log("enable_activity_domain");
        self.active_domains.lock().unwrap().push(domain);
        Ok(())
    }

    fn disable_activity_domain(&self, domain: Domain) -> Result<(), BackendError> {
        self.log("disable_activity_domain");
        self.active_domains.lock().unwrap().retain(|d| *d != domain);
        Ok(())
    }

    fn flush_activity(&self, _pool: PoolHandle) -> Result<(), BackendError> {
        self.log("flush_activity");
        self.explicit_flushes.fetch_add(1, Ordering::SeqCst);
        let records: Vec<ActivityRecord> = std::mem::take(&mut *self.pending.lock().unwrap());
        if !records.is_empty() {
            self.deliver(&records);
        }
        Ok(())
    }

    fn op_string(&self, domain: Domain, op: u32, _kind: u32) -> String {
        match domain {
            Domain::HipApi => match op {
                CALL_ID_LAUNCH_KERNEL => "hipLaunchKernel".to_string(),
                CALL_ID_MODULE_LAUNCH_KERNEL => "hipModuleLaunchKernel".to_string(),
                CALL_ID_MEMCPY => "hipMemcpyAsync".to_string(),
                other => format!("hip_api_{}", other),
            },
            _ => match op {
                op_id::DISPATCH => "KernelExecution".to_string(),
                op_id::COPY => "CopyHostToDevice".to_string(),
                op_id::BARRIER => "Barrier".to_string(),
                other => format!("device_op_{}", other),
            },
        }
    }

    fn kernel_symbol(&self, launch: &KernelLaunch) -> Option<String> {
        let key = match launch {
            KernelLaunch::ByFunction { function, .. } => *function,
            KernelLaunch::ByModuleHandle { handle } => *handle,
        };
        self.kernel_symbols.lock().unwrap().get(&key).cloned()
    }

    fn is_call_config(&self, call_id: ApiCallId) -> bool {
        matches!(call_id, CALL_ID_PUSH_CALL_CONFIG | CALL_ID_POP_CALL_CONFIG)
    }

    fn records<'buf>(
        &self,
        buffer: &'buf [u8],
    ) -> Box<dyn Iterator<Item = ActivityRecord> + 'buf> {
        let records: Vec<ActivityRecord> = bincode::deserialize(buffer).unwrap_or_default();
        Box::new(records.into_iter())
    }
}

// ── Test data helpers ────────────────────────────────────────────────────────

pub fn enter(call_id: ApiCallId, correlation_id: u64) -> ApiCallbackData {
    ApiCallbackData {
        call_id,
        phase: ApiPhase::Enter,
        correlation_id,
        launch: None,
    }
}

pub fn exit(call_id: ApiCallId, correlation_id: u64) -> ApiCallbackData {
    ApiCallbackData {
        call_id,
        phase: ApiPhase::Exit,
        correlation_id,
        launch: None,
    }
}

pub fn device_record(domain: Domain, op: u32, correlation_id: u64) -> ActivityRecord {
    ActivityRecord {
        domain,
        op,
        kind: 0,
        correlation_id,
        begin_ns: 1_000,
        end_ns: 3_500,
        device_id: 0,
        queue_id: 2,
        bytes: if op == op_id::COPY { 4096 } else { 0 },
    }
}
