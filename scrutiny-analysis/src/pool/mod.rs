//! Detector Pool (C7, spec §4.7). A bounded, adaptive free-list of reusable
//! `DetectorRegistry` instances, keyed by a single "kind" (the closed set
//! of connascence + NASA detectors never varies within a run). Ground:
//! `drift_storage::batch::writer::BatchWriter`'s dedicated-thread +
//! bounded-channel idiom, adapted from a single writer to a pool of
//! acquire/release slots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::errors::PoolError;

use crate::detectors::{create_default_registry, DetectorRegistry};

struct Inner {
    free: Sender<Box<DetectorRegistry>>,
    free_rx: Receiver<Box<DetectorRegistry>>,
    outstanding: AtomicUsize,
    capacity: Mutex<usize>,
    min_size: usize,
    max_size: usize,
    acquire_timeout: Duration,
    config: AnalysisConfig,
}

/// A checked-out detector set. Returned to the pool's free-list on drop
/// (ground: RAII handle idiom for pooled resources).
pub struct DetectorHandle {
    registry: Option<Box<DetectorRegistry>>,
    pool: Arc<Inner>,
}

impl std::ops::Deref for DetectorHandle {
    type Target = DetectorRegistry;
    fn deref(&self) -> &DetectorRegistry {
        self.registry.as_ref().expect("handle dropped its registry early")
    }
}

impl std::ops::DerefMut for DetectorHandle {
    fn deref_mut(&mut self) -> &mut DetectorRegistry {
        self.registry.as_mut().expect("handle dropped its registry early")
    }
}

impl Drop for DetectorHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            // best-effort: a full channel (pool shrunk under us) just drops the instance
            let _ = self.pool.free.try_send(registry);
        }
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct DetectorPool {
    inner: Arc<Inner>,
}

impl DetectorPool {
    pub fn new(config: AnalysisConfig) -> Self {
        let min_size = scrutiny_core::constants::POOL_MIN_SIZE;
        let max_size = scrutiny_core::constants::POOL_MAX_SIZE;
        let (tx, rx) = bounded(max_size);
        for _ in 0..min_size {
            let _ = tx.try_send(Box::new(create_default_registry(&config)));
        }
        Self {
            inner: Arc::new(Inner {
                free: tx,
                free_rx: rx,
                outstanding: AtomicUsize::new(0),
                capacity: Mutex::new(min_size),
                min_size,
                max_size,
                acquire_timeout: Duration::from_millis(scrutiny_core::constants::POOL_ACQUIRE_TIMEOUT_MS),
                config,
            }),
        }
    }

    /// Acquire a clean detector set, growing the pool if there is headroom
    /// and the free-list is momentarily empty, logging contention past 3ms.
    pub fn acquire(&self) -> Result<DetectorHandle, PoolError> {
        let started = Instant::now();
        loop {
            match self.inner.free_rx.try_recv() {
                Ok(registry) => {
                    self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
                    let waited = started.elapsed();
                    if waited > Duration::from_millis(scrutiny_core::constants::POOL_CONTENTION_LOG_THRESHOLD_MS) {
                        tracing::warn!(waited_ms = waited.as_millis() as u64, "detector pool contention");
                    }
                    return Ok(DetectorHandle { registry: Some(registry), pool: Arc::clone(&self.inner) });
                }
                Err(TryRecvError::Empty) => {
                    if self.try_grow() {
                        continue;
                    }
                    if started.elapsed() >= self.inner.acquire_timeout {
                        return Err(PoolError::AcquireTimeout {
                            waited_ms: started.elapsed().as_millis() as u64,
                            limit_ms: self.inner.acquire_timeout.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(Duration::from_micros(200));
                }
                Err(TryRecvError::Disconnected) => return Err(PoolError::ShutDown),
            }
        }
    }

    fn try_grow(&self) -> bool {
        let mut capacity = self.inner.capacity.lock().expect("pool capacity mutex poisoned");
        if *capacity >= self.inner.max_size {
            return false;
        }
        *capacity += 1;
        let _ = self.inner.free.try_send(Box::new(create_default_registry(&self.inner.config)));
        true
    }

    /// Shrinks the free-list back to `min_pool_size`, draining idle
    /// instances; called when the orchestrator observes memory pressure.
    pub fn shrink_to_min(&self) {
        let mut capacity = self.inner.capacity.lock().expect("pool capacity mutex poisoned");
        while *capacity > self.inner.min_size {
            if self.inner.free_rx.try_recv().is_err() {
                break;
            }
            *capacity -= 1;
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Sums `nasa_metrics()` across every instance currently parked in the
    /// free-list. Called once after a run's detector fan-out completes, when
    /// every handle has been returned, so this sees the whole pool's
    /// accumulated state rather than a fresh, zeroed instance.
    pub fn nasa_metrics_snapshot(&self) -> (usize, f64) {
        let mut drained = Vec::new();
        while let Ok(registry) = self.inner.free_rx.try_recv() {
            drained.push(registry);
        }

        let mut evaluable_sites = 0usize;
        let mut weighted_violations = 0.0f64;
        for registry in &drained {
            let (sites, weighted) = registry.nasa_metrics();
            evaluable_sites += sites;
            weighted_violations += weighted;
        }

        for registry in drained {
            let _ = self.inner.free.try_send(registry);
        }

        (evaluable_sites, weighted_violations)
    }
}
