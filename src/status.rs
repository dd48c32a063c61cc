use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use luminary::ManagerStatus;
use luminary::format::OutputFormat;

use crate::settings::Settings;

/// Show what luminary would do
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format: text or json
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

#[derive(Serialize)]
struct StatusEnvelope {
    config_path: Option<String>,
    config_found: bool,
    backend_kind: String,
    #[serde(flatten)]
    manager: ManagerStatus,
}

pub fn run(settings: &Settings, args: &StatusArgs) -> Result<()> {
    // A fresh manager: this command reports configuration, it takes nothing.
    let manager = settings.manager(&[], None)?;
    let envelope = StatusEnvelope {
        config_path: settings.path.as_ref().map(|p| p.display().to_string()),
        config_found: settings.path.as_ref().is_some_and(|p| p.exists()),
        backend_kind: settings.backend_kind().to_string(),
        manager: manager.snapshot(),
    };

    let mut out = io::stdout().lock();
    match args.format.unwrap_or_default() {
        OutputFormat::Json => writeln!(out, "{}", OutputFormat::Json.serialize(&envelope)?)?,
        OutputFormat::Text => render_text(&mut out, &envelope)?,
    }
    Ok(())
}

fn render_text(out: &mut impl Write, envelope: &StatusEnvelope) -> io::Result<()> {
    match (&envelope.config_path, envelope.config_found) {
        (Some(path), true) => writeln!(out, "[OK] config: {path}")?,
        (Some(path), false) => writeln!(out, "[OK] config: {path} (not found, using defaults)")?,
        (None, _) => writeln!(out, "[OK] config: defaults")?,
    }
    writeln!(
        out,
        "[OK] backend: {} ({})",
        envelope.manager.backend, envelope.backend_kind
    )?;
    writeln!(out, "[OK] reason: {}", envelope.manager.reason)?;
    writeln!(out, "Assertion kinds (acquired in this order):")?;
    for kind in &envelope.manager.configured {
        writeln!(out, "  - {kind}")?;
    }
    writeln!(
        out,
        "State: {}",
        if envelope.manager.active { "Active" } else { "Inactive" }
    )
}
