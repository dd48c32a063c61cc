//! Power backend trait and built-in implementations.
//!
//! Defines the interface between the assertion manager and the host's power
//! management facility. A backend knows how to take one assertion of a given
//! kind and how to give a previously taken one back; everything else (which
//! kinds, when, how failures are tolerated) lives in the manager.

pub mod dry_run;
#[cfg(feature = "system")]
pub mod system;

use std::fmt;

use serde::Deserialize;

use crate::assertion::{AssertionHandle, AssertionKind};

pub use dry_run::DryRunBackend;
#[cfg(feature = "system")]
pub use system::SystemBackend;

/// A host power-management facility.
///
/// # Key Invariants
///
/// - **Independence**: each acquisition is a separate OS assertion. Releasing
///   one handle never affects another.
/// - **Single release**: a handle returned by [`acquire`](Self::acquire) is
///   released at most once. Releasing it again is an error, not a double free.
/// - **Bounded**: both calls return promptly; neither waits on user input.
#[allow(clippy::missing_errors_doc)]
pub trait PowerBackend {
    /// The error type returned by backend operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire one assertion of `kind`, tagged with a human-readable `reason`
    /// that the OS may surface (e.g. in `pmset -g assertions`).
    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, Self::Error>;

    /// Release a previously acquired assertion.
    fn release(&mut self, handle: AssertionHandle) -> Result<(), Self::Error>;

    /// Short name for logs and status output.
    fn name(&self) -> &'static str;
}

impl<B: PowerBackend + ?Sized> PowerBackend for Box<B> {
    type Error = B::Error;

    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, Self::Error> {
        (**self).acquire(kind, reason)
    }

    fn release(&mut self, handle: AssertionHandle) -> Result<(), Self::Error> {
        (**self).release(handle)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Which backend to construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Real OS assertions (requires the `system` feature).
    #[default]
    System,
    /// Log-only backend that never touches the OS.
    DryRun,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Backend selected at runtime, so the binary can switch between real and
/// dry-run assertions without generics leaking into the CLI layer.
pub enum AnyBackend {
    /// Real OS assertions.
    #[cfg(feature = "system")]
    System(SystemBackend),
    /// Log-only assertions.
    DryRun(DryRunBackend),
}

impl AnyBackend {
    /// Construct the backend for `kind`.
    ///
    /// When the crate is built without the `system` feature, a request for
    /// [`BackendKind::System`] falls back to [`DryRunBackend`] with a warning.
    #[must_use]
    pub fn new(kind: BackendKind, app_name: &str, app_reverse_domain: &str) -> Self {
        match kind {
            #[cfg(feature = "system")]
            BackendKind::System => Self::System(SystemBackend::new(app_name, app_reverse_domain)),
            #[cfg(not(feature = "system"))]
            BackendKind::System => {
                let _ = (app_name, app_reverse_domain);
                tracing::warn!("built without the 'system' feature; using dry-run backend");
                Self::DryRun(DryRunBackend::new())
            }
            BackendKind::DryRun => Self::DryRun(DryRunBackend::new()),
        }
    }
}

impl PowerBackend for AnyBackend {
    type Error = crate::error::BackendError;

    fn acquire(&mut self, kind: AssertionKind, reason: &str) -> Result<AssertionHandle, Self::Error> {
        match self {
            #[cfg(feature = "system")]
            Self::System(b) => b.acquire(kind, reason),
            Self::DryRun(b) => b.acquire(kind, reason),
        }
    }

    fn release(&mut self, handle: AssertionHandle) -> Result<(), Self::Error> {
        match self {
            #[cfg(feature = "system")]
            Self::System(b) => b.release(handle),
            Self::DryRun(b) => b.release(handle),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "system")]
            Self::System(b) => b.name(),
            Self::DryRun(b) => b.name(),
        }
    }
}
