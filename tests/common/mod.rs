//! Shared test helpers for luminary integration tests.
//!
//! [`MockBackend`] records every OS call in a [`Ledger`] that the test keeps a
//! handle to after moving the backend into a manager.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use luminary::{AssertionHandle, AssertionKind, PowerBackend};

/// Everything a [`MockBackend`] did.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Kinds the backend refuses to acquire.
    pub refuse: BTreeSet<AssertionKind>,
    /// Raw handle ids whose release fails.
    pub fail_release: BTreeSet<u64>,
    /// Handles the "OS" still holds.
    pub live: BTreeMap<AssertionHandle, AssertionKind>,
    /// Every acquire attempt, in order.
    pub acquire_calls: Vec<AssertionKind>,
    /// Every release attempt, in order.
    pub release_calls: Vec<AssertionHandle>,
    /// Reasons passed to acquire.
    pub reasons: Vec<String>,
    next_id: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("mock OS refused {0}")]
    Refused(AssertionKind),
    #[error("mock OS failed to release {0}")]
    ReleaseFailed(AssertionHandle),
}

#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    ledger: Arc<Mutex<Ledger>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that refuses the given kinds.
    pub fn refusing(kinds: impl IntoIterator<Item = AssertionKind>) -> Self {
        let backend = Self::new();
        backend.ledger().refuse.extend(kinds);
        backend
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }
}

impl PowerBackend for MockBackend {
    type Error = MockError;

    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, MockError> {
        let mut ledger = self.ledger();
        ledger.acquire_calls.push(kind);
        ledger.reasons.push(reason.to_owned());
        if ledger.refuse.contains(&kind) {
            return Err(MockError::Refused(kind));
        }
        ledger.next_id += 1;
        let handle = AssertionHandle::from_raw(ledger.next_id);
        ledger.live.insert(handle, kind);
        Ok(handle)
    }

    fn release(&mut self, handle: AssertionHandle) -> Result<(), MockError> {
        let mut ledger = self.ledger();
        ledger.release_calls.push(handle);
        if ledger.fail_release.contains(&handle.as_raw()) {
            return Err(MockError::ReleaseFailed(handle));
        }
        ledger.live.remove(&handle);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Binary helpers
// ---------------------------------------------------------------------------

/// Path of the built `luminary` binary.
pub fn luminary_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_luminary"))
}

/// Run `luminary` in dry-run mode with an isolated config path, feeding
/// `stdin` to the process.
pub fn luminary_dry(config: &Path, args: &[&str], stdin: &str) -> Output {
    use std::io::Write as _;

    let mut child = Command::new(luminary_bin())
        .arg("--dry-run")
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("LUMINARY_CONFIG")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn luminary");
    // The process may exit before reading stdin (e.g. `status`).
    let _ = child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(stdin.as_bytes());
    child.wait_with_output().expect("failed to wait for luminary")
}

/// Like [`luminary_dry`] but asserts success and returns stdout.
pub fn luminary_ok(config: &Path, args: &[&str], stdin: &str) -> String {
    let out = luminary_dry(config, args, stdin);
    assert!(
        out.status.success(),
        "luminary {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).expect("stdout is utf-8")
}
