//! Luminary configuration (`config.toml`).
//!
//! Defines which assertion kinds `enable()` requests, the reason string shown
//! to the OS, and which backend to use.
//!
//! ```toml
//! [assertions]
//! kinds = ["prevent-idle-system-sleep", "prevent-idle-display-sleep", "prevent-display-sleep"]
//! reason = "User requested to prevent sleep"
//!
//! [backend]
//! kind = "system"
//! app_name = "luminary"
//! app_reverse_domain = "io.luminary"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assertion::AssertionKind;
use crate::backend::BackendKind;
use crate::manager::{DEFAULT_REASON, ManagerConfig};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LUMINARY_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level Luminary configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LuminaryConfig {
    /// Assertion settings.
    #[serde(default)]
    pub assertions: AssertionsConfig,

    /// Backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

// ---------------------------------------------------------------------------
// AssertionsConfig
// ---------------------------------------------------------------------------

/// Which assertions to take and why.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertionsConfig {
    /// Kinds requested on every enable, in order.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<AssertionKind>,

    /// Reason attached to each assertion.
    #[serde(default = "default_reason")]
    pub reason: String,
}

impl Default for AssertionsConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            reason: default_reason(),
        }
    }
}

fn default_kinds() -> Vec<AssertionKind> {
    AssertionKind::ALL.to_vec()
}

fn default_reason() -> String {
    DEFAULT_REASON.to_owned()
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Backend selection and the identity reported to the OS.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Which backend to use.
    #[serde(default)]
    pub kind: BackendKind,

    /// Application name shown by the OS next to held assertions.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Reverse-DNS application identifier (used on macOS).
    #[serde(default = "default_app_reverse_domain")]
    pub app_reverse_domain: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            app_name: default_app_name(),
            app_reverse_domain: default_app_reverse_domain(),
        }
    }
}

fn default_app_name() -> String {
    "luminary".to_owned()
}

fn default_app_reverse_domain() -> String {
    "io.luminary".to_owned()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a Luminary configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl LuminaryConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but is invalid, returns a [`ConfigError`].
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), parse
    /// errors, or validation failures.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields, an empty or
    /// duplicated kind list, or an empty reason.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError {
            path: None,
            message,
        };
        let kinds = &self.assertions.kinds;
        if kinds.is_empty() {
            return Err(invalid(
                "assertions.kinds must list at least one assertion kind".to_owned(),
            ));
        }
        for (i, kind) in kinds.iter().enumerate() {
            if kinds[..i].contains(kind) {
                return Err(invalid(format!(
                    "assertions.kinds lists '{kind}' more than once"
                )));
            }
        }
        if self.assertions.reason.trim().is_empty() {
            return Err(invalid("assertions.reason must not be empty".to_owned()));
        }
        Ok(())
    }

    /// The manager settings described by this config.
    #[must_use]
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            kinds: self.assertions.kinds.clone(),
            reason: self.assertions.reason.clone(),
        }
    }
}

/// Resolve the config file location.
///
/// Order: `explicit`, then `$LUMINARY_CONFIG`, then
/// `$XDG_CONFIG_HOME/luminary/config.toml`, then
/// `$HOME/.config/luminary/config.toml`. Returns `None` when no candidate can
/// be formed (no home directory).
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_path_with(explicit, |key| std::env::var_os(key))
}

fn resolve_path_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<std::ffi::OsString>,
) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_owned());
    }
    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
    if let Some(p) = non_empty(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    if let Some(dir) = non_empty("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join("luminary").join("config.toml"));
    }
    non_empty("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("luminary")
            .join("config.toml")
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn defaults_all_fields() {
        let cfg = LuminaryConfig::default();
        assert_eq!(cfg.assertions.kinds, AssertionKind::ALL.to_vec());
        assert_eq!(cfg.assertions.reason, "User requested to prevent sleep");
        assert_eq!(cfg.backend.kind, BackendKind::System);
        assert_eq!(cfg.backend.app_name, "luminary");
        assert_eq!(cfg.backend.app_reverse_domain, "io.luminary");
        assert_eq!(cfg.manager_config(), ManagerConfig::default());
    }

    #[test]
    fn parse_empty_string() {
        let cfg = LuminaryConfig::parse("").unwrap();
        assert_eq!(cfg, LuminaryConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[assertions]
kinds = ["prevent-idle-display-sleep", "prevent-idle-system-sleep"]
reason = "Watching a film"

[backend]
kind = "dry-run"
app_name = "movie-night"
app_reverse_domain = "org.example.movie"
"#;
        let cfg = LuminaryConfig::parse(toml).unwrap();
        assert_eq!(
            cfg.assertions.kinds,
            vec![
                AssertionKind::PreventIdleDisplaySleep,
                AssertionKind::PreventIdleSystemSleep
            ]
        );
        assert_eq!(cfg.assertions.reason, "Watching a film");
        assert_eq!(cfg.backend.kind, BackendKind::DryRun);
        assert_eq!(cfg.backend.app_name, "movie-night");
        assert_eq!(cfg.backend.app_reverse_domain, "org.example.movie");
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let cfg = LuminaryConfig::parse("[backend]\nkind = \"dry-run\"\n").unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::DryRun);
        assert_eq!(cfg.backend.app_name, "luminary");
        assert_eq!(cfg.assertions, AssertionsConfig::default());
    }

    #[test]
    fn parse_rejects_unknown_nested_field() {
        let toml = r#"
[assertions]
reason = "ok"
retries = 3
"#;
        let err = LuminaryConfig::parse(toml).unwrap_err();
        assert!(err.message.contains("unknown field"), "{}", err.message);
        assert!(err.message.contains("retries"), "{}", err.message);
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let err = LuminaryConfig::parse("[assertions]\nkinds = [\"prevent-lid-close\"]\n").unwrap_err();
        assert!(err.message.contains("prevent-lid-close"), "{}", err.message);
    }

    #[test]
    fn parse_rejects_empty_kinds() {
        let err = LuminaryConfig::parse("[assertions]\nkinds = []\n").unwrap_err();
        assert!(err.message.contains("at least one"), "{}", err.message);
    }

    #[test]
    fn parse_rejects_duplicate_kinds() {
        let toml = "[assertions]\nkinds = [\"prevent-display-sleep\", \"prevent-display-sleep\"]\n";
        let err = LuminaryConfig::parse(toml).unwrap_err();
        assert!(err.message.contains("more than once"), "{}", err.message);
    }

    #[test]
    fn parse_rejects_blank_reason() {
        let err = LuminaryConfig::parse("[assertions]\nreason = \"  \"\n").unwrap_err();
        assert!(err.message.contains("reason"), "{}", err.message);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LuminaryConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, LuminaryConfig::default());
    }

    #[test]
    fn load_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nkind = \"quantum\"\n").unwrap();
        let err = LuminaryConfig::load(&path).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }

    #[test]
    fn resolve_prefers_explicit_then_env_then_xdg_then_home() {
        let env = |pairs: &'static [(&'static str, &'static str)]| {
            move |key: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| OsString::from(*v))
            }
        };

        let explicit = Path::new("/tmp/x.toml");
        assert_eq!(
            resolve_path_with(Some(explicit), env(&[(CONFIG_ENV, "/env.toml")])),
            Some(PathBuf::from("/tmp/x.toml"))
        );
        assert_eq!(
            resolve_path_with(None, env(&[(CONFIG_ENV, "/env.toml"), ("HOME", "/home/u")])),
            Some(PathBuf::from("/env.toml"))
        );
        assert_eq!(
            resolve_path_with(None, env(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")])),
            Some(PathBuf::from("/xdg/luminary/config.toml"))
        );
        assert_eq!(
            resolve_path_with(None, env(&[(CONFIG_ENV, ""), ("HOME", "/home/u")])),
            Some(PathBuf::from("/home/u/.config/luminary/config.toml"))
        );
        assert_eq!(resolve_path_with(None, env(&[])), None);
    }
}
