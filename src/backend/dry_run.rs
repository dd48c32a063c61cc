//! Dry-run backend: mints handles and logs, never touches the OS.

use std::collections::BTreeMap;

use tracing::info;

use super::PowerBackend;
use crate::assertion::{AssertionHandle, AssertionKind};
use crate::error::BackendError;

/// Backend that pretends every acquisition succeeds.
///
/// Handles are issued from a monotonically increasing counter and tracked so
/// that releasing an unknown or already released handle fails the same way a
/// real backend would.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    next_id: u64,
    held: BTreeMap<AssertionHandle, AssertionKind>,
}

impl DryRunBackend {
    /// Create an empty dry-run backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl PowerBackend for DryRunBackend {
    type Error = BackendError;

    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, Self::Error> {
        self.next_id += 1;
        let handle = AssertionHandle::from_raw(self.next_id);
        self.held.insert(handle, kind);
        info!(%kind, %handle, reason, "dry-run: would acquire assertion");
        Ok(handle)
    }

    fn release(&mut self, handle: AssertionHandle) -> Result<(), Self::Error> {
        let kind = self
            .held
            .remove(&handle)
            .ok_or(BackendError::UnknownHandle(handle))?;
        info!(%kind, %handle, "dry-run: would release assertion");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
