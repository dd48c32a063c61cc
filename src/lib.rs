//! luminary library crate: keep the machine awake.
//!
//! The primary interface is the `luminary` binary. The library exposes the
//! [`AssertionManager`] and its backends so other front-ends (and the
//! integration tests) can drive them directly.
//!
//! ```no_run
//! use luminary::{AssertionManager, DryRunBackend};
//!
//! let manager = AssertionManager::new(DryRunBackend::new());
//! let rx = manager.subscribe();
//! manager.toggle();
//! assert_eq!(rx.try_recv(), Ok(manager.is_active()));
//! ```

pub mod assertion;
pub mod backend;
pub mod config;
pub mod error;
pub mod failpoints;
pub mod format;
pub mod manager;
pub mod signal;
pub mod telemetry;

pub use assertion::{AssertionHandle, AssertionKind};
pub use backend::{AnyBackend, BackendKind, DryRunBackend, PowerBackend};
#[cfg(feature = "system")]
pub use backend::SystemBackend;
pub use error::{AssertionError, BackendError};
pub use manager::{AssertionManager, ManagerConfig, ManagerStatus};
pub use signal::ListenerId;
