//! Interface to the instrumentation framework
//!
//! roclens does not own attribute definitions, the region tree, or record
//! output. It drives them through this interface, which the surrounding
//! framework implements. Handles are plain indices: the framework's region
//! tree is append-only, so a stored handle stays valid for the lifetime of
//! the framework and never extends a node's lifetime.

/// Opaque handle to a node in the framework's region tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Opaque handle to a registered attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute(pub u32);

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Uint,
}

/// Storage and processing properties for an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttrProperties {
    /// Store values inline in records instead of the region tree.
    pub as_value: bool,

    /// Do not trigger measurement events when this attribute is set.
    pub skip_events: bool,

    /// Values of this attribute nest (begin/end discipline).
    pub nested: bool,

    /// Values can be summed across records.
    pub aggregatable: bool,
}

/// A single field value in an emitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Uint(u64),
    Str(String),
}

/// Framework lifecycle events a service can subscribe to.
///
/// Fired synchronously by the framework, in a fixed order over a run:
/// post-init once, then any number of snapshot/pre-flush events, then
/// pre-finish, then finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    PostInit,
    Snapshot,
    PreFlush,
    PreFinish,
    Finish,
}

/// Handler invoked synchronously when a lifecycle event fires.
pub type EventHandler = Box<dyn Fn() + Send + Sync>;

/// The instrumentation framework surface consumed by roclens.
pub trait Instrumentation: Send + Sync {
    /// Register a named, typed attribute.
    fn create_attribute(&self, name: &str, ty: AttrType, props: AttrProperties) -> Attribute;

    /// Open a nested region for `attr` on the calling thread.
    fn begin_region(&self, attr: Attribute, value: &str);

    /// Close the innermost open region for `attr` on the calling thread.
    fn end_region(&self, attr: Attribute);

    /// Tree node of the innermost open region for `attr`, if that region is
    /// a reference entry in the tree.
    fn current_node(&self, attr: Attribute) -> Option<NodeId>;

    /// Append a child entry under `parent` (or the tree root) and return its
    /// handle.
    fn make_tree_entry(&self, attr: Attribute, value: &str, parent: Option<NodeId>) -> NodeId;

    /// Hand a finished record to the framework for processing. `parent`
    /// attaches the record below a tree node; `None` emits it top-level.
    fn emit_record(&self, fields: &[(Attribute, AttrValue)], parent: Option<NodeId>);

    /// Register a lifecycle event handler.
    fn subscribe(&self, event: LifecycleEvent, handler: EventHandler);
}
