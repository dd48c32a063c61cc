//! OS-backed assertions via the `keepawake` crate.
//!
//! Each acquisition builds its own [`keepawake::KeepAwake`] guard configured
//! for exactly one inhibition, so kinds can succeed or fail independently and
//! be released one at a time. Dropping a guard releases the OS assertion.
//!
//! Kind mapping:
//! - `PreventIdleSystemSleep` → `idle`
//! - `PreventIdleDisplaySleep` → `display`
//! - `PreventDisplaySleep` → `display`
//!
//! `keepawake` has no separate "no display sleep" level, so both display kinds
//! become independent display assertions.

use std::collections::BTreeMap;

use tracing::debug;

use super::PowerBackend;
use crate::assertion::{AssertionHandle, AssertionKind};
use crate::error::BackendError;

/// Backend that takes real power assertions from the host OS.
pub struct SystemBackend {
    app_name: String,
    app_reverse_domain: String,
    next_id: u64,
    held: BTreeMap<AssertionHandle, (AssertionKind, keepawake::KeepAwake)>,
}

impl SystemBackend {
    /// Create a backend that identifies itself to the OS as `app_name`.
    #[must_use]
    pub fn new(app_name: &str, app_reverse_domain: &str) -> Self {
        Self {
            app_name: app_name.to_owned(),
            app_reverse_domain: app_reverse_domain.to_owned(),
            next_id: 0,
            held: BTreeMap::new(),
        }
    }
}

impl PowerBackend for SystemBackend {
    type Error = BackendError;

    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, Self::Error> {
        let guard = keepawake::Builder::default()
            .idle(kind == AssertionKind::PreventIdleSystemSleep)
            .display(kind.is_display())
            .sleep(false)
            .reason(reason)
            .app_name(&self.app_name)
            .app_reverse_domain(&self.app_reverse_domain)
            .create()
            .map_err(|e| BackendError::Refused {
                kind,
                message: e.to_string(),
            })?;

        self.next_id += 1;
        let handle = AssertionHandle::from_raw(self.next_id);
        self.held.insert(handle, (kind, guard));
        debug!(%kind, %handle, "acquired OS assertion");
        Ok(handle)
    }

    fn release(&mut self, handle: AssertionHandle) -> Result<(), Self::Error> {
        let (kind, guard) = self
            .held
            .remove(&handle)
            .ok_or(BackendError::UnknownHandle(handle))?;
        drop(guard);
        debug!(%kind, %handle, "released OS assertion");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releasing_unknown_handle_fails_without_touching_os() {
        let mut backend = SystemBackend::new("luminary", "io.luminary");
        let err = backend
            .release(AssertionHandle::from_raw(42))
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownHandle(_)));
    }
}
