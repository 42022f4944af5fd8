//! Attribute registry adapter
//!
//! Registers the tracer's metric attributes with the framework once at
//! startup. Stateless afterwards; the handles are plain copies.

use crate::framework::{AttrProperties, AttrType, Attribute, Instrumentation};

/// Handles for every attribute the tracer emits.
#[derive(Debug, Clone, Copy)]
pub struct TraceAttributes {
    /// Nested region attribute for intercepted host API calls.
    pub api: Attribute,

    pub activity_name: Attribute,
    pub activity_start: Attribute,
    pub activity_end: Attribute,
    pub activity_duration: Attribute,
    pub activity_device: Attribute,
    pub activity_queue: Attribute,
    pub activity_bytes: Attribute,
    pub kernel_name: Attribute,

    /// Diagnostic region bracketing each buffer flush.
    pub flush_region: Attribute,
}

impl TraceAttributes {
    pub fn create(framework: &dyn Instrumentation) -> Self {
        let value = AttrProperties {
            as_value: true,
            skip_events: true,
            ..Default::default()
        };
        let info = AttrProperties {
            skip_events: true,
            ..Default::default()
        };

        Self {
            api: framework.create_attribute(
                "rocm.api",
                AttrType::String,
                AttrProperties {
                    nested: true,
                    ..Default::default()
                },
            ),
            activity_name: framework.create_attribute("rocm.activity", AttrType::String, info),
            activity_start: framework.create_attribute("rocm.starttime", AttrType::Uint, value),
            activity_end: framework.create_attribute("rocm.endtime", AttrType::Uint, value),
            activity_duration: framework.create_attribute(
                "rocm.activity.duration",
                AttrType::Uint,
                AttrProperties {
                    aggregatable: true,
                    ..value
                },
            ),
            activity_device: framework.create_attribute(
                "rocm.activity.device",
                AttrType::Uint,
                info,
            ),
            activity_queue: framework.create_attribute("rocm.activity.queue", AttrType::Uint, info),
            activity_bytes: framework.create_attribute("rocm.activity.bytes", AttrType::Uint, info),
            kernel_name: framework.create_attribute("rocm.kernel.name", AttrType::String, info),
            flush_region: framework.create_attribute(
                "roclens.flush",
                AttrType::String,
                AttrProperties::default(),
            ),
        }
    }
}
