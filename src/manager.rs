//! The sleep-prevention assertion manager.
//!
//! [`AssertionManager`] turns a list of independent OS power assertions into a
//! single logical "keep awake" switch.
//!
//! # Key Invariants
//!
//! - `is_active() == (held_count() > 0)` whenever the lock is free, including
//!   after a backend, failpoint or listener panic unwound through an operation.
//! - Every held handle came from a successful `acquire` and has not been
//!   passed to `release` yet; no handle is held twice.
//! - `enable()`, `disable()` and `toggle()` run entirely inside one lock, so
//!   two concurrent toggles never both acquire.
//! - Observers are notified once per operation that changes or re-evaluates
//!   state, after all backend calls for that operation are done.
//!
//! Acquisition is best-effort: a kind that fails is recorded and skipped, and
//! never rolls back kinds that already succeeded. Release is best-effort too:
//! a failed release is recorded but the handle leaves bookkeeping regardless.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Receiver;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assertion::{AssertionHandle, AssertionKind};
use crate::backend::PowerBackend;
use crate::error::AssertionError;
use crate::failpoints::FP_RELEASE;
use crate::signal::{ListenerId, StateSignal};

/// Default reason attached to every assertion.
pub const DEFAULT_REASON: &str = "User requested to prevent sleep";

// ---------------------------------------------------------------------------
// ManagerConfig
// ---------------------------------------------------------------------------

/// What `enable()` asks the backend for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Kinds to acquire, in order.
    pub kinds: Vec<AssertionKind>,
    /// Reason string handed to the OS with each assertion.
    pub reason: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            kinds: AssertionKind::ALL.to_vec(),
            reason: DEFAULT_REASON.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// ManagerStatus
// ---------------------------------------------------------------------------

/// Point-in-time, serializable view of a manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    /// Whether at least one assertion is held.
    pub active: bool,
    /// Kinds currently held, in acquisition order.
    pub held: Vec<AssertionKind>,
    /// Kinds `enable()` will request.
    pub configured: Vec<AssertionKind>,
    /// Reason attached to assertions.
    pub reason: String,
    /// Backend name.
    pub backend: &'static str,
    /// Failures recorded by the last backend-touching operation.
    pub failures: Vec<String>,
}

// ---------------------------------------------------------------------------
// AssertionManager
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Held {
    handle: AssertionHandle,
    kind: AssertionKind,
}

struct Inner<B> {
    backend: B,
    config: ManagerConfig,
    held: Vec<Held>,
    failures: Vec<AssertionError>,
    signal: StateSignal,
}

/// Owns a set of OS power assertions and exposes them as one switch.
///
/// Constructed disabled. Dropping the manager releases anything still held
/// through the same path as [`disable`](Self::disable).
pub struct AssertionManager<B: PowerBackend> {
    active: AtomicBool,
    inner: Mutex<Inner<B>>,
}

impl<B: PowerBackend> AssertionManager<B> {
    /// Create a disabled manager that requests every [`AssertionKind`].
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ManagerConfig::default())
    }

    /// Create a disabled manager with an explicit kind list and reason.
    pub fn with_config(backend: B, config: ManagerConfig) -> Self {
        Self {
            active: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                backend,
                config,
                held: Vec::new(),
                failures: Vec::new(),
                signal: StateSignal::new(),
            }),
        }
    }

    // A panic in the backend or a listener poisons the lock. `held` and
    // `active` are updated together after every single backend call, so the
    // state left behind is still consistent and safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Inner<B>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether at least one assertion is currently held. Never blocks.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Acquire every configured kind that the backend grants.
    ///
    /// Returns `true` if at least one assertion is held afterwards. Calling it
    /// while already active returns `true` without touching the backend.
    pub fn enable(&self) -> bool {
        let mut inner = self.lock();
        self.enable_locked(&mut inner)
    }

    /// Release every held assertion. A no-op when nothing is held.
    pub fn disable(&self) {
        let mut inner = self.lock();
        self.disable_locked(&mut inner);
    }

    /// Flip between enabled and disabled. Returns the resulting state.
    pub fn toggle(&self) -> bool {
        let mut inner = self.lock();
        if inner.held.is_empty() {
            self.enable_locked(&mut inner)
        } else {
            self.disable_locked(&mut inner);
            false
        }
    }

    fn enable_locked(&self, inner: &mut Inner<B>) -> bool {
        if !inner.held.is_empty() {
            debug!(held = inner.held.len(), "enable: already active");
            return true;
        }

        let Inner {
            backend,
            config,
            held,
            failures,
            signal,
        } = inner;
        failures.clear();

        for &kind in &config.kinds {
            let acquired = match crate::fp!(kind.acquire_failpoint()) {
                Ok(()) => backend
                    .acquire(kind, &config.reason)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match acquired {
                Ok(handle) => {
                    debug!(%kind, %handle, backend = backend.name(), "assertion acquired");
                    held.push(Held { handle, kind });
                    self.active.store(true, Ordering::Release);
                }
                Err(detail) => {
                    let failure = AssertionError::AcquisitionFailed { kind, detail };
                    warn!("{failure}");
                    failures.push(failure);
                }
            }
        }

        let active = !held.is_empty();
        if active {
            info!(
                held = held.len(),
                requested = config.kinds.len(),
                "sleep prevention enabled"
            );
        } else {
            let failure = AssertionError::AllAcquisitionsFailed {
                attempted: config.kinds.len(),
            };
            warn!("{failure}");
            failures.push(failure);
        }

        signal.publish(active);
        active
    }

    fn disable_locked(&self, inner: &mut Inner<B>) {
        if inner.held.is_empty() {
            debug!("disable: already inactive");
            return;
        }

        let Inner {
            backend,
            held,
            failures,
            signal,
            ..
        } = inner;
        failures.clear();

        // One handle at a time: a panic mid-release must not drop the rest
        // of the set unreleased.
        while let Some(Held { handle, kind }) = held.pop() {
            self.active.store(!held.is_empty(), Ordering::Release);
            let released = match crate::fp!(FP_RELEASE) {
                Ok(()) => backend.release(handle).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match released {
                Ok(()) => debug!(%kind, %handle, "assertion released"),
                Err(detail) => {
                    let failure = AssertionError::ReleaseFailed { handle, detail };
                    warn!(%kind, "{failure}");
                    failures.push(failure);
                }
            }
        }

        info!("sleep prevention disabled");
        signal.publish(false);
    }

    /// Number of assertions currently held.
    pub fn held_count(&self) -> usize {
        self.lock().held.len()
    }

    /// Kinds currently held, in acquisition order.
    pub fn held_kinds(&self) -> Vec<AssertionKind> {
        self.lock().held.iter().map(|h| h.kind).collect()
    }

    /// Non-fatal failures recorded by the most recent `enable()` or
    /// `disable()` that reached the backend.
    pub fn last_failures(&self) -> Vec<AssertionError> {
        self.lock().failures.clone()
    }

    /// Serializable view of the manager.
    pub fn snapshot(&self) -> ManagerStatus {
        let inner = self.lock();
        ManagerStatus {
            active: !inner.held.is_empty(),
            held: inner.held.iter().map(|h| h.kind).collect(),
            configured: inner.config.kinds.clone(),
            reason: inner.config.reason.clone(),
            backend: inner.backend.name(),
            failures: inner.failures.iter().map(ToString::to_string).collect(),
        }
    }

    /// Register a callback invoked with the new state after each operation.
    ///
    /// The callback runs while the manager is locked: it may call
    /// [`is_active`](Self::is_active) but must not call `enable`, `disable`
    /// or `toggle`.
    pub fn listen(&self, listener: impl Fn(bool) + Send + Sync + 'static) -> ListenerId {
        self.lock().signal.listen(listener)
    }

    /// Remove a listener registered with [`listen`](Self::listen).
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.lock().signal.unlisten(id)
    }

    /// Channel receiving the new state after each operation.
    pub fn subscribe(&self) -> Receiver<bool> {
        self.lock().signal.subscribe()
    }
}

impl<B: PowerBackend> Drop for AssertionManager<B> {
    fn drop(&mut self) {
        if self.is_active() {
            debug!("releasing assertions on teardown");
        }
        self.disable();
    }
}

impl<B: PowerBackend> std::fmt::Debug for AssertionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionManager")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
