use std::path::PathBuf;

use anyhow::{Context, Result};

use luminary::config::{self, LuminaryConfig};
use luminary::{AnyBackend, AssertionKind, AssertionManager, BackendKind};

/// Resolved configuration plus command-line overrides.
pub struct Settings {
    pub config: LuminaryConfig,
    pub path: Option<PathBuf>,
    pub dry_run: bool,
}

impl Settings {
    pub fn load(explicit: Option<PathBuf>, dry_run: bool) -> Result<Self> {
        let path = config::resolve_path(explicit.as_deref());
        let config = match &path {
            Some(p) => LuminaryConfig::load(p).context("failed to load luminary config")?,
            None => LuminaryConfig::default(),
        };
        Ok(Self {
            config,
            path,
            dry_run,
        })
    }

    pub fn backend_kind(&self) -> BackendKind {
        if self.dry_run {
            BackendKind::DryRun
        } else {
            self.config.backend.kind
        }
    }

    /// Build a disabled manager. Empty `kinds` / `None` reason keep the
    /// configured values.
    pub fn manager(
        &self,
        kinds: &[AssertionKind],
        reason: Option<&str>,
    ) -> Result<AssertionManager<AnyBackend>> {
        let mut manager_config = self.config.manager_config();
        if !kinds.is_empty() {
            let mut unique = Vec::with_capacity(kinds.len());
            for kind in kinds {
                if !unique.contains(kind) {
                    unique.push(*kind);
                }
            }
            manager_config.kinds = unique;
        }
        if let Some(reason) = reason {
            anyhow::ensure!(!reason.trim().is_empty(), "--reason must not be empty");
            manager_config.reason = reason.to_owned();
        }

        let backend_config = &self.config.backend;
        let backend = AnyBackend::new(
            self.backend_kind(),
            &backend_config.app_name,
            &backend_config.app_reverse_domain,
        );
        Ok(AssertionManager::with_config(backend, manager_config))
    }
}
