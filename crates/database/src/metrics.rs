use std::sync::atomic::{AtomicU64, Ordering};

/// Diagnostic counters shared by every `VolumeQueryService` that is handed
/// the same instance. None of them is used for admission control.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    instances_created: AtomicU64,
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a service construction and returns the new total.
    pub(crate) fn record_instance(&self) -> u64 {
        self.instances_created.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_query(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Services constructed so far. Disposal does not decrement this.
    pub fn instances_created(&self) -> u64 {
        self.instances_created.load(Ordering::Relaxed)
    }

    pub fn queries_executed(&self) -> u64 {
        self.queries_executed.load(Ordering::Relaxed)
    }

    pub fn queries_failed(&self) -> u64 {
        self.queries_failed.load(Ordering::Relaxed)
    }
}
