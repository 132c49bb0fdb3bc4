//! `watch`: follow the live state over the event stream.
//!
//! Prints one line per reconciled change (NDJSON with `-o json`) and
//! drives a progress bar while a scan runs.

use std::io::IsTerminal;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

use filmdeck_core::{ConnectionState, Controller, DashboardState, DashboardStream, DeviceConfig};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status::{StatusReport, phase_label};

pub async fn handle(device: DeviceConfig, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = Controller::new(device)?;
    let mut states = controller.subscribe();
    let mut connection = controller.connection_state();

    controller.activate().await?;
    let result = follow(&controller, &mut states, &mut connection, &args, global).await;
    controller.deactivate().await;
    result
}

async fn follow(
    controller: &Controller,
    states: &mut DashboardStream,
    connection: &mut watch::Receiver<ConnectionState>,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // A hidden bar swallows its println output, so only draw on a terminal.
    let show_bar = !args.no_progress
        && !global.quiet
        && matches!(global.output, OutputFormat::Table)
        && std::io::stderr().is_terminal();
    let mut printer = Printer::new(global, show_bar);
    let mut seen_scanning = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break;
            }
            next = states.changed() => {
                let Some(state) = next else { break };
                printer.emit(&state)?;

                seen_scanning |= state.scan.is_scanning;
                if args.until_done && seen_scanning && !state.scan.is_scanning {
                    break;
                }
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = connection.borrow_and_update().clone();
                match current {
                    ConnectionState::Live => {
                        tracing::info!("event stream live");
                        // The snapshot may equal the initial state and publish nothing.
                        printer.emit(&controller.state())?;
                    }
                    ConnectionState::Stale { reason } => {
                        printer.finish();
                        return Err(CliError::StreamLost { reason });
                    }
                    ConnectionState::Connecting | ConnectionState::Disconnected => {}
                }
            }
        }
    }

    printer.finish();
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────

struct Printer<'a> {
    global: &'a GlobalOpts,
    color: bool,
    bar: Option<ProgressBar>,
    last: Option<Arc<DashboardState>>,
}

impl<'a> Printer<'a> {
    fn new(global: &'a GlobalOpts, show_bar: bool) -> Self {
        Self {
            global,
            color: output::should_color(&global.color),
            bar: show_bar.then(scan_bar),
            last: None,
        }
    }

    fn emit(&mut self, state: &Arc<DashboardState>) -> Result<(), CliError> {
        if self.last.as_ref() == Some(state) {
            return Ok(());
        }
        self.last = Some(Arc::clone(state));

        let report = StatusReport::new(state);
        let line = match self.global.output {
            OutputFormat::Table => summary(state, self.color),
            OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(&report, true)?,
            OutputFormat::Yaml => format!("---\n{}", output::render_yaml(&report)?.trim_end()),
            OutputFormat::Plain => phase_label(report.phase),
        };

        match self.bar {
            Some(ref bar) => {
                update_bar(bar, state);
                bar.println(line);
            }
            None => output::print_output(&line, self.global.quiet),
        }
        Ok(())
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

fn scan_bar() -> ProgressBar {
    let style = ProgressStyle::with_template("{bar:40} {pos}/{len} frames  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(1).with_style(style);
    bar.set_position(0);
    bar
}

fn update_bar(bar: &ProgressBar, state: &DashboardState) {
    match state.scan.progress() {
        Some(progress) => {
            bar.set_length(u64::from(progress.target));
            bar.set_position(u64::from(progress.current));
            bar.set_message(format!("{} left", state.scan.time_remaining));
        }
        None => {
            bar.set_position(0);
            bar.set_message(String::new());
        }
    }
}

/// One-line view of the state for the table format.
fn summary(state: &DashboardState, color: bool) -> String {
    let mut parts: Vec<String> = state
        .capabilities()
        .map(|(capability, cap)| {
            let mark = if cap.enabled { "" } else { " (disabled)" };
            format!("{capability}={}{mark}", output::flag(cap.active, color))
        })
        .collect();

    parts.push(format!("scan={}", phase_label(state.phase())));
    if let Some(progress) = state.scan.progress() {
        parts.push(format!("frame={}/{}", progress.current, progress.target));
    }
    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_marks_disabled_capabilities() {
        let mut state = DashboardState::default();
        state.light.enabled = true;
        state.light.active = true;

        let line = summary(&state, false);
        assert!(line.starts_with("light=on  advance=off (disabled)"));
        assert!(line.ends_with("scan=idle"));
    }
}
