use std::io::{self, BufRead, Write};

use anyhow::Result;

use luminary::{AssertionManager, PowerBackend};

use crate::settings::Settings;

const HELP: &str = "commands: t(oggle) | s(tatus) | h(elp) | q(uit)   (empty line toggles)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Toggle,
    Status,
    Help,
    Quit,
    Unknown,
}

fn parse(line: &str) -> Command {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "t" | "toggle" => Command::Toggle,
        "s" | "status" => Command::Status,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::Unknown,
    }
}

pub fn run(settings: &Settings) -> Result<()> {
    let manager = settings.manager(&[], None)?;
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    session(&manager, stdin.lock(), &mut out)
}

/// Drive `manager` from line commands, rendering every observed state change
/// as "Active"/"Inactive". Everything is released when the session ends.
fn session<B: PowerBackend>(
    manager: &AssertionManager<B>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let changes = manager.subscribe();
    writeln!(out, "luminary: Inactive ({HELP})")?;

    for line in input.lines() {
        match parse(&line?) {
            Command::Toggle => {
                manager.toggle();
                for failure in manager.last_failures() {
                    writeln!(out, "[WARN] {failure}")?;
                }
            }
            Command::Status => {
                let status = manager.snapshot();
                let held: Vec<_> = status.held.iter().map(ToString::to_string).collect();
                writeln!(
                    out,
                    "{} ({} held: {})",
                    state_label(status.active),
                    held.len(),
                    if held.is_empty() { "-".to_owned() } else { held.join(", ") }
                )?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
            Command::Unknown => writeln!(out, "unknown command ({HELP})")?,
        }
        for active in changes.try_iter() {
            writeln!(out, "{}", state_label(active))?;
        }
        out.flush()?;
    }

    manager.disable();
    for active in changes.try_iter() {
        writeln!(out, "{}", state_label(active))?;
    }
    Ok(())
}

const fn state_label(active: bool) -> &'static str {
    if active { "Active" } else { "Inactive" }
}
