//! Feature-gated failpoint injection for simulating OS power failures.
//!
//! Compile with `--features failpoints` to enable injection. Without the
//! feature, the `fp!()` macro expands to `Ok(())`.
//!
//! The manager consults one failpoint per assertion kind before acquiring
//! (see [`AssertionKind::acquire_failpoint`](crate::assertion::AssertionKind::acquire_failpoint))
//! and [`FP_RELEASE`] before every release, so tests can make any backend
//! refuse a specific kind or fail a release.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

/// Failpoint consulted before each release.
pub const FP_RELEASE: &str = "FP_RELEASE";

/// Actions a failpoint can take when triggered.
#[derive(Clone, Debug)]
pub enum FailpointAction {
    /// No-op (default).
    Off,
    /// Fail every time with the given message.
    Error(String),
    /// Fail once with the given message, then turn `Off`.
    Once(String),
    /// Panic with the given message.
    Panic(String),
    /// Sleep for the given duration, then succeed.
    Sleep(Duration),
}

static REGISTRY: LazyLock<Mutex<HashMap<&'static str, FailpointAction>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn registry() -> std::sync::MutexGuard<'static, HashMap<&'static str, FailpointAction>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Set a failpoint action.
pub fn set(name: &'static str, action: FailpointAction) {
    registry().insert(name, action);
}

/// Clear a specific failpoint.
pub fn clear(name: &'static str) {
    registry().remove(name);
}

/// Clear all failpoints.
pub fn clear_all() {
    registry().clear();
}

/// Check if a failpoint is set and execute its action.
///
/// # Errors
/// Returns the configured message for `Error` and `Once` actions.
///
/// # Panics
/// Panics if the failpoint action is `Panic`.
pub fn check(name: &str) -> Result<(), String> {
    let mut registry = registry();
    match registry.get(name).cloned() {
        None | Some(FailpointAction::Off) => Ok(()),
        Some(FailpointAction::Error(msg)) => Err(msg),
        Some(FailpointAction::Once(msg)) => {
            if let Some(slot) = registry.get_mut(name) {
                *slot = FailpointAction::Off;
            }
            Err(msg)
        }
        Some(FailpointAction::Panic(msg)) => {
            drop(registry); // don't poison the registry
            panic!("failpoint {name}: {msg}")
        }
        Some(FailpointAction::Sleep(d)) => {
            drop(registry);
            std::thread::sleep(d);
            Ok(())
        }
    }
}

/// Failpoint injection point.
///
/// With `failpoints` feature: checks the registry and may return `Err` or panic.
/// Without `failpoints` feature: always `Ok(())`.
///
/// Usage: `fp!(FP_RELEASE)?;`
#[cfg(feature = "failpoints")]
#[macro_export]
macro_rules! fp {
    ($name:expr) => {
        $crate::failpoints::check($name).map_err($crate::error::BackendError::Injected)
    };
}

#[cfg(not(feature = "failpoints"))]
#[macro_export]
macro_rules! fp {
    ($name:expr) => {{
        let _ = $name;
        Ok::<(), $crate::error::BackendError>(())
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    // Names are unique per test; the registry is process-global.

    #[test]
    fn fp_noop_when_not_set() {
        assert!(fp!("FP_TEST_NOOP").is_ok());
    }

    #[test]
    #[cfg(feature = "failpoints")]
    fn fp_returns_error_when_set() {
        set("FP_TEST_ERROR", FailpointAction::Error("injected".into()));
        let err = fp!("FP_TEST_ERROR").unwrap_err();
        assert!(err.to_string().contains("injected"), "{err}");
        assert!(fp!("FP_TEST_ERROR").is_err(), "Error action is sticky");
        clear("FP_TEST_ERROR");
        assert!(fp!("FP_TEST_ERROR").is_ok());
    }

    #[test]
    #[cfg(feature = "failpoints")]
    fn fp_once_fails_a_single_time() {
        set("FP_TEST_ONCE", FailpointAction::Once("transient".into()));
        assert!(fp!("FP_TEST_ONCE").is_err());
        assert!(fp!("FP_TEST_ONCE").is_ok());
        clear("FP_TEST_ONCE");
    }

    #[test]
    #[cfg(feature = "failpoints")]
    fn fp_sleep_returns_ok() {
        set("FP_TEST_SLEEP", FailpointAction::Sleep(Duration::from_millis(1)));
        assert!(fp!("FP_TEST_SLEEP").is_ok());
        clear("FP_TEST_SLEEP");
    }

    #[test]
    #[cfg(feature = "failpoints")]
    fn fp_panic_leaves_registry_usable() {
        set("FP_TEST_PANIC", FailpointAction::Panic("boom".into()));
        let caught = std::panic::catch_unwind(|| check("FP_TEST_PANIC"));
        assert!(caught.is_err());
        clear("FP_TEST_PANIC");
        assert!(check("FP_TEST_PANIC").is_ok());
    }

    #[test]
    fn off_action_behaves_like_unset() {
        set("FP_TEST_OFF", FailpointAction::Off);
        assert!(check("FP_TEST_OFF").is_ok());
        clear("FP_TEST_OFF");
    }
}
