//! Rendering for `--output`.
//!
//! `table` and `plain` are human views built by the caller; `json`,
//! `json-compact` and `yaml` serialize the value itself.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Whether to emit ANSI colors. `auto` honors `NO_COLOR`.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal(),
    }
}

/// `on`/`off`, green when set.
pub fn flag(value: bool, color: bool) -> String {
    let text = if value { "on" } else { "off" };
    match (color, value) {
        (true, true) => text.green().to_string(),
        (true, false) => text.dimmed().to_string(),
        (false, _) => text.to_owned(),
    }
}

/// Serialize `data` for the machine-readable formats; `None` for the
/// human ones.
fn structured<T: Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Option<Result<String, CliError>> {
    match format {
        OutputFormat::Json => Some(render_json(data, false)),
        OutputFormat::JsonCompact => Some(render_json(data, true)),
        OutputFormat::Yaml => Some(render_yaml(data)),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

/// A collection: one table row per item, or one `id_fn` line per item.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    if let Some(rendered) = structured(format, data) {
        return rendered;
    }
    Ok(match format {
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
        _ => render_table(&data.iter().map(to_row).collect::<Vec<_>>()),
    })
}

/// A single value: `detail_fn` for the table view, `id_fn` for plain.
pub fn render_single<T: Serialize>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError> {
    if let Some(rendered) = structured(format, data) {
        return rendered;
    }
    Ok(match format {
        OutputFormat::Plain => id_fn(data),
        _ => detail_fn(data),
    })
}

/// Write to stdout unless quiet or empty.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{output}");
}

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}
