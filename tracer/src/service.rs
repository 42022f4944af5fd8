//! Tracer lifecycle controller
//!
//! Owns backend setup and teardown and ties the interceptor and flusher to
//! the framework's lifecycle events. Setup failures degrade (the feature
//! stays disabled, with an error log); nothing in here aborts the host
//! process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use roclens_shared::types::activity::Domain;
use roclens_shared::utils::format_bytes;

use crate::attributes::TraceAttributes;
use crate::backend::{ApiCallback, BufferCallback, PoolHandle, TraceBackend};
use crate::config::TracerConfig;
use crate::correlation::CorrelationStore;
use crate::flush::ActivityFlusher;
use crate::framework::{Instrumentation, LifecycleEvent};
use crate::interceptor::ApiInterceptor;
use crate::stats::{StatsSnapshot, TraceStats};

/// Guard against double registration. Dispatch itself is closure-based;
/// this only exists to surface the conflict.
static SERVICE_ACTIVE: AtomicBool = AtomicBool::new(false);

pub struct TraceService {
    config: TracerConfig,
    framework: Arc<dyn Instrumentation>,
    backend: Arc<dyn TraceBackend>,
    store: Arc<CorrelationStore>,
    stats: Arc<TraceStats>,
    interceptor: Arc<ApiInterceptor>,
    flusher: Arc<ActivityFlusher>,
    pool: Mutex<Option<PoolHandle>>,
}

impl TraceService {
    /// Build the service and wire it to the framework's lifecycle events.
    ///
    /// A second registration while one service is active is a configuration
    /// conflict: it is warned about but still proceeds with a fresh
    /// instance, matching the backend's single-subscriber model as closely
    /// as a degraded mode allows.
    pub fn register(
        framework: Arc<dyn Instrumentation>,
        backend: Arc<dyn TraceBackend>,
        config: TracerConfig,
    ) -> Arc<Self> {
        if SERVICE_ACTIVE.swap(true, Ordering::SeqCst) {
            warn!("roclens: tracer service is already active, registering another instance");
        }

        let attrs = TraceAttributes::create(framework.as_ref());
        let store = Arc::new(CorrelationStore::new());
        let stats = Arc::new(TraceStats::new());

        let interceptor = Arc::new(ApiInterceptor::new(
            Arc::clone(&framework),
            Arc::clone(&backend),
            Arc::clone(&store),
            Arc::clone(&stats),
            attrs,
            config.enable_tracing,
            config.record_kernel_names,
        ));
        let flusher = Arc::new(ActivityFlusher::new(
            Arc::clone(&framework),
            Arc::clone(&backend),
            Arc::clone(&store),
            Arc::clone(&stats),
            attrs,
        ));

        let service = Arc::new(Self {
            config,
            framework: Arc::clone(&framework),
            backend,
            store,
            stats,
            interceptor,
            flusher,
            pool: Mutex::new(None),
        });

        let s = Arc::clone(&service);
        framework.subscribe(LifecycleEvent::PostInit, Box::new(move || s.post_init()));
        let s = Arc::clone(&service);
        framework.subscribe(LifecycleEvent::PreFinish, Box::new(move || s.pre_finish()));
        let s = Arc::clone(&service);
        framework.subscribe(LifecycleEvent::Finish, Box::new(move || s.finish()));

        info!(
            "roclens: registered tracer service, activity tracing is {}",
            if service.config.enable_tracing {
                "on"
            } else {
                "off"
            }
        );

        service
    }

    /// Counter snapshot, for diagnostics and tests.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The correlation store, for diagnostics and tests.
    pub fn correlation_store(&self) -> &CorrelationStore {
        &self.store
    }

    fn post_init(&self) {
        // Callbacks must come up before tracing: activity teardown can
        // still deliver buffers that expect interceptor context
        self.init_callbacks();

        if self.config.enable_tracing {
            self.init_tracing();
        }
    }

    fn init_callbacks(&self) {
        let interceptor = Arc::clone(&self.interceptor);
        let callback: ApiCallback = Arc::new(move |data| interceptor.handle(data));

        if let Err(e) = self.backend.enable_api_callbacks(Domain::HipApi, callback) {
            error!("roclens: enable callback (api): {}", e);
            return;
        }

        info!("roclens: callbacks initialized");
    }

    fn init_tracing(&self) {
        let flusher = Arc::clone(&self.flusher);
        let callback: BufferCallback = Arc::new(move |buffer| {
            flusher.flush(buffer);
            debug!(
                "roclens: processed {} buffer",
                format_bytes(buffer.len() as u64)
            );
        });

        let pool = match self.backend.open_pool(self.config.buffer_size, callback) {
            Ok(pool) => pool,
            Err(e) => {
                error!("roclens: open_pool(): {}", e);
                return;
            }
        };
        *self.pool_slot() = Some(pool);

        for domain in [Domain::HipOps, Domain::HccOps] {
            if let Err(e) = self.backend.enable_activity_domain(domain, pool) {
                error!("roclens: enable_activity_domain({:?}): {}", domain, e);
                return;
            }
        }

        // Drain anything still buffered before the framework flushes its
        // own output, so records generated up to that point are delivered
        let backend = Arc::clone(&self.backend);
        self.framework.subscribe(
            LifecycleEvent::PreFlush,
            Box::new(move || {
                if let Err(e) = backend.flush_activity(pool) {
                    warn!("roclens: flush_activity(): {}", e);
                }
            }),
        );

        info!("roclens: tracing initialized");
    }

    fn pre_finish(&self) {
        self.finish_callbacks();

        if self.config.enable_tracing {
            self.finish_tracing();
        }
    }

    fn finish_callbacks(&self) {
        let _ = self.backend.disable_api_callbacks(Domain::HipApi);

        info!("roclens: callbacks stopped");
    }

    fn finish_tracing(&self) {
        let _ = self.backend.disable_activity_domain(Domain::HccOps);
        let _ = self.backend.disable_activity_domain(Domain::HipOps);

        if let Some(pool) = self.pool_slot().take() {
            if let Err(e) = self.backend.close_pool(pool) {
                error!("roclens: close_pool(): {}", e);
            }
        }

        info!("roclens: tracing stopped");
    }

    fn finish(&self) {
        if self.config.enable_tracing {
            let s = self.stats.snapshot();
            info!(
                "roclens: {} activity flushes, {} records processed, {} records flushed",
                s.flushes, s.records_seen, s.records_flushed
            );
            debug!(
                "roclens: {} correlations stored; {} found, {} missed",
                s.correlations_stored, s.correlations_found, s.correlations_missed
            );
        }

        SERVICE_ACTIVE.store(false, Ordering::SeqCst);
    }

    fn pool_slot(&self) -> std::sync::MutexGuard<'_, Option<PoolHandle>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
