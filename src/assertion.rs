//! Power assertion kinds and handles.
//!
//! An assertion is an OS-level token that inhibits one specific sleep, idle or
//! dim behavior for as long as it is held. [`AssertionKind`] names the
//! behaviors Luminary knows how to inhibit; [`AssertionHandle`] is the opaque
//! token a backend hands back for each successful acquisition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AssertionKind
// ---------------------------------------------------------------------------

/// A single OS sleep/idle inhibition primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    /// Keep the system from sleeping because of user inactivity.
    PreventIdleSystemSleep,
    /// Keep the display from sleeping because of user inactivity.
    PreventIdleDisplaySleep,
    /// Keep the display from dimming or sleeping at all while held.
    PreventDisplaySleep,
}

impl AssertionKind {
    /// Every kind, in the order `enable()` requests them by default.
    pub const ALL: [Self; 3] = [
        Self::PreventIdleSystemSleep,
        Self::PreventIdleDisplaySleep,
        Self::PreventDisplaySleep,
    ];

    /// Stable kebab-case name, as used in config files and CLI flags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreventIdleSystemSleep => "prevent-idle-system-sleep",
            Self::PreventIdleDisplaySleep => "prevent-idle-display-sleep",
            Self::PreventDisplaySleep => "prevent-display-sleep",
        }
    }

    /// Failpoint name consulted before acquiring this kind.
    #[must_use]
    pub const fn acquire_failpoint(self) -> &'static str {
        match self {
            Self::PreventIdleSystemSleep => "FP_ACQUIRE_PREVENT_IDLE_SYSTEM_SLEEP",
            Self::PreventIdleDisplaySleep => "FP_ACQUIRE_PREVENT_IDLE_DISPLAY_SLEEP",
            Self::PreventDisplaySleep => "FP_ACQUIRE_PREVENT_DISPLAY_SLEEP",
        }
    }

    /// Whether this kind targets the display rather than the whole system.
    #[must_use]
    pub const fn is_display(self) -> bool {
        matches!(self, Self::PreventIdleDisplaySleep | Self::PreventDisplaySleep)
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`AssertionKind`] from text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown assertion kind '{value}' (expected one of: {expected})")]
pub struct ParseKindError {
    /// The text that failed to parse.
    pub value: String,
    expected: String,
}

impl FromStr for AssertionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| ParseKindError {
                value: s.to_owned(),
                expected: Self::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

// ---------------------------------------------------------------------------
// AssertionHandle
// ---------------------------------------------------------------------------

/// Opaque identifier for one held assertion.
///
/// Only a backend mints handles. The manager stores them and hands each one
/// back to the same backend exactly once for release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssertionHandle(u64);

impl AssertionHandle {
    /// Wrap a raw backend identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend identifier.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssertionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
