use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use crossbeam_channel::{Receiver, after, never, select};

use luminary::format::OutputFormat;
use luminary::{AssertionKind, AssertionManager, PowerBackend};

use crate::settings::Settings;

/// Prevent sleep until released
#[derive(Args, Debug)]
pub struct HoldArgs {
    /// Assertion kinds to take, comma separated (default: from config)
    #[arg(long, value_delimiter = ',', value_name = "KIND")]
    pub kinds: Vec<AssertionKind>,

    /// Reason reported to the OS
    #[arg(long)]
    pub reason: Option<String>,

    /// Release automatically after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Output format: text or json
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

/// What ended a hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Release {
    Enter,
    StdinClosed,
    Timeout,
}

enum StdinEvent {
    Line,
    Eof,
}

pub fn run(settings: &Settings, args: &HoldArgs) -> Result<()> {
    let manager = settings.manager(&args.kinds, args.reason.as_deref())?;
    let mut out = io::stdout().lock();
    hold(
        &manager,
        args.format.unwrap_or_default(),
        args.duration,
        spawn_stdin_reader,
        &mut out,
    )
}

/// Enable, wait for a release event from `stdin` or the deadline, disable.
///
/// Fails without waiting when the backend granted nothing.
fn hold<B: PowerBackend>(
    manager: &AssertionManager<B>,
    format: OutputFormat,
    duration: Option<u64>,
    stdin: impl FnOnce() -> Receiver<StdinEvent>,
    out: &mut impl Write,
) -> Result<()> {
    if !manager.enable() {
        report(out, manager, format, "enable")?;
        bail!("no assertion could be acquired; the system may still sleep");
    }
    report(out, manager, format, "enable")?;
    if format == OutputFormat::Text {
        match duration {
            Some(secs) => writeln!(out, "Holding for {secs}s (press Enter to release early).")?,
            None => writeln!(out, "Press Enter (or close stdin) to release.")?,
        }
    }
    out.flush()?;

    let reason = wait(stdin(), duration.map(Duration::from_secs));
    tracing::info!(?reason, "releasing hold");

    manager.disable();
    report(out, manager, format, "disable")
}

/// Block until Enter, a closed stdin (when no timeout is set), or the timeout.
fn wait(stdin: Receiver<StdinEvent>, timeout: Option<Duration>) -> Release {
    let deadline = timeout.map_or_else(never, after);
    let mut stdin = Some(stdin);
    loop {
        let events = stdin.clone().unwrap_or_else(never);
        select! {
            recv(events) -> event => match event {
                Ok(StdinEvent::Line) => return Release::Enter,
                Ok(StdinEvent::Eof) | Err(_) => {
                    if timeout.is_none() {
                        return Release::StdinClosed;
                    }
                    // Keep holding until the deadline.
                    stdin = None;
                }
            },
            recv(deadline) -> _ => return Release::Timeout,
        }
    }
}

fn spawn_stdin_reader() -> Receiver<StdinEvent> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let mut line = String::new();
        let event = match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => StdinEvent::Eof,
            Ok(_) => StdinEvent::Line,
        };
        let _ = tx.send(event);
    });
    rx
}

fn report<B: PowerBackend>(
    out: &mut impl Write,
    manager: &AssertionManager<B>,
    format: OutputFormat,
    action: &str,
) -> Result<()> {
    let status = manager.snapshot();
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "action": action, "status": status });
            writeln!(out, "{}", OutputFormat::Json.serialize(&value)?)?;
        }
        OutputFormat::Text => {
            for failure in &status.failures {
                writeln!(out, "[WARN] {failure}")?;
            }
            if status.active {
                let kinds: Vec<_> = status.held.iter().map(ToString::to_string).collect();
                writeln!(
                    out,
                    "Active: holding {} of {} assertion(s): {}",
                    status.held.len(),
                    status.configured.len(),
                    kinds.join(", ")
                )?;
            } else {
                writeln!(out, "Inactive")?;
            }
        }
    }
    Ok(())
}
