//! Error types for assertion management.
//!
//! [`AssertionError`] describes the non-fatal failures the manager records
//! while acquiring or releasing assertions. None of them are ever returned to
//! a caller of `enable()`/`disable()`; they are logged and kept for inspection
//! via `last_failures()`.
//!
//! [`BackendError`] is the error type of the built-in backends.

use thiserror::Error;

use crate::assertion::{AssertionHandle, AssertionKind};

/// A non-fatal failure recorded by the assertion manager.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// One assertion kind could not be obtained. The remaining kinds were
    /// still attempted.
    #[error("failed to acquire {kind}: {detail}")]
    AcquisitionFailed {
        /// The kind that was refused.
        kind: AssertionKind,
        /// Backend-provided description.
        detail: String,
    },

    /// Releasing a held assertion failed at the OS level. The handle was
    /// dropped from bookkeeping anyway; the OS may still hold it until the
    /// process exits.
    #[error("failed to release assertion {handle}: {detail}")]
    ReleaseFailed {
        /// The handle that could not be released.
        handle: AssertionHandle,
        /// Backend-provided description.
        detail: String,
    },

    /// Every configured kind failed during one `enable()` call.
    #[error("no assertion could be acquired ({attempted} attempted); system may still sleep")]
    AllAcquisitionsFailed {
        /// How many kinds were attempted.
        attempted: usize,
    },
}

/// Errors returned by the built-in [`PowerBackend`](crate::backend::PowerBackend)s.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The platform refused or could not create the assertion.
    #[error("platform refused {kind}: {message}")]
    Refused {
        /// The kind being acquired.
        kind: AssertionKind,
        /// Platform error text.
        message: String,
    },

    /// The handle is not held by this backend (already released or never
    /// issued here).
    #[error("assertion {0} is not held by this backend")]
    UnknownHandle(AssertionHandle),

    /// A failure injected through the failpoint registry.
    #[error("injected failure: {0}")]
    Injected(String),
}
