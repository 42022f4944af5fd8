//! Allocator statistics service
//!
//! Queries a memory allocator registry at every framework snapshot and
//! emits per-allocator usage records plus aggregate totals. One record per
//! allocator keeps the attribute set generic (allocator name + sizes)
//! instead of one attribute pair per allocator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use roclens_shared::types::allocator::AllocatorStats;

use crate::framework::{AttrProperties, AttrType, AttrValue, Attribute, Instrumentation, LifecycleEvent};

/// The allocator registry surface consumed by the statistics service.
pub trait AllocatorRegistry: Send + Sync {
    /// Names of all registered allocators.
    fn allocator_names(&self) -> Vec<String>;

    /// Current statistics for one allocator, if it exists.
    fn stats(&self, name: &str) -> Option<AllocatorStats>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStatsConfig {
    /// Emit one record per allocator in addition to the totals.
    pub per_allocator_stats: bool,
}

impl Default for MemoryStatsConfig {
    fn default() -> Self {
        Self {
            per_allocator_stats: true,
        }
    }
}

pub struct MemoryStatsService {
    framework: Arc<dyn Instrumentation>,
    registry: Arc<dyn AllocatorRegistry>,
    config: MemoryStatsConfig,

    alloc_name: Attribute,
    alloc_current_size: Attribute,
    alloc_actual_size: Attribute,
    alloc_hwm: Attribute,
    alloc_count: Attribute,
    total_size: Attribute,
    total_count: Attribute,
}

impl MemoryStatsService {
    pub fn register(
        framework: Arc<dyn Instrumentation>,
        registry: Arc<dyn AllocatorRegistry>,
        config: MemoryStatsConfig,
    ) -> Arc<Self> {
        let value = AttrProperties {
            as_value: true,
            skip_events: true,
            aggregatable: true,
            ..Default::default()
        };

        let service = Arc::new(Self {
            alloc_name: framework.create_attribute(
                "mem.alloc.name",
                AttrType::String,
                AttrProperties {
                    skip_events: true,
                    ..Default::default()
                },
            ),
            alloc_current_size: framework.create_attribute(
                "mem.alloc.current.size",
                AttrType::Uint,
                value,
            ),
            alloc_actual_size: framework.create_attribute(
                "mem.alloc.actual.size",
                AttrType::Uint,
                value,
            ),
            alloc_hwm: framework.create_attribute(
                "mem.alloc.highwatermark",
                AttrType::Uint,
                value,
            ),
            alloc_count: framework.create_attribute("mem.alloc.count", AttrType::Uint, value),
            total_size: framework.create_attribute("mem.total.size", AttrType::Uint, value),
            total_count: framework.create_attribute("mem.total.count", AttrType::Uint, value),
            framework: Arc::clone(&framework),
            registry,
            config,
        });

        let s = Arc::clone(&service);
        framework.subscribe(LifecycleEvent::Snapshot, Box::new(move || s.snapshot()));
        framework.subscribe(
            LifecycleEvent::Finish,
            Box::new(|| info!("roclens: finished memory stats service")),
        );

        info!("roclens: registered memory stats service");

        service
    }

    fn snapshot(&self) {
        let mut total_size: u64 = 0;
        let mut total_count: u64 = 0;

        for name in self.registry.allocator_names() {
            let Some(stats) = self.registry.stats(&name) else {
                continue;
            };

            total_size += stats.current_size;
            total_count += stats.allocation_count;

            if self.config.per_allocator_stats {
                self.emit_allocator(&name, &stats);
            }
        }

        self.framework.emit_record(
            &[
                (self.total_size, AttrValue::Uint(total_size)),
                (self.total_count, AttrValue::Uint(total_count)),
            ],
            None,
        );
    }

    fn emit_allocator(&self, name: &str, stats: &AllocatorStats) {
        self.framework.emit_record(
            &[
                (self.alloc_name, AttrValue::Str(name.to_string())),
                (self.alloc_actual_size, AttrValue::Uint(stats.actual_size)),
                (
                    self.alloc_current_size,
                    AttrValue::Uint(stats.current_size),
                ),
                (self.alloc_hwm, AttrValue::Uint(stats.high_watermark)),
                (self.alloc_count, AttrValue::Uint(stats.allocation_count)),
            ],
            None,
        );
    }
}
