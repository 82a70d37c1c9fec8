//! Output formatting: one line per published state, text or JSON.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use hotstate_core::{AsyncState, Failure, Phase};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn phase_tag(phase: Phase, color: bool) -> String {
    let tag = format!("{:<7}", phase.to_string());
    if !color {
        return tag;
    }
    match phase {
        Phase::Idle => tag.green().to_string(),
        Phase::Loading => tag.yellow().to_string(),
        Phase::Failed => tag.red().bold().to_string(),
    }
}

// ── State lines ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct StateLine<'a, T> {
    phase: String,
    data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Renders states in the format selected by `--output`.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
    color: bool,
}

impl Printer {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Render one state. `failure` is the error consumed from the state's
    /// one-time event, if this render was the one to consume it.
    pub fn render_state<T: Serialize>(
        &self,
        state: &AsyncState<T>,
        failure: Option<&Failure>,
        summary: impl Fn(&T) -> String,
    ) -> Result<String, CliError> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(&StateLine {
                phase: state.phase().to_string(),
                data: &state.data,
                error: failure.map(Failure::message),
            })?),
            OutputFormat::Text => {
                let tag = phase_tag(state.phase(), self.color);
                let mut line = format!("{tag} {}", summary(&state.data));
                if let Some(failure) = failure {
                    let note = format!("error: {}", failure.message());
                    if self.color {
                        line = format!("{line}  {}", note.red());
                    } else {
                        line = format!("{line}  {note}");
                    }
                }
                Ok(line)
            }
        }
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Counter {
        count: u32,
    }

    fn summary(c: &Counter) -> String {
        format!("count={}", c.count)
    }

    #[test]
    fn text_line_without_color() {
        let printer = Printer::new(OutputFormat::Text, false);
        let line = printer
            .render_state(&AsyncState::loading(Counter { count: 2 }), None, summary)
            .unwrap();
        assert_eq!(line, "loading count=2");
    }

    #[test]
    fn text_line_carries_consumed_failure() {
        let printer = Printer::new(OutputFormat::Text, false);
        let state = AsyncState::new(Counter { count: 1 }).fail(Failure::new("network"));
        let failure = state.failure().cloned();
        let line = printer
            .render_state(&state, failure.as_ref(), summary)
            .unwrap();
        assert_eq!(line, "failed  count=1  error: network");
    }

    #[test]
    fn json_line_shape() {
        let printer = Printer::new(OutputFormat::Json, false);
        let line = printer
            .render_state(&AsyncState::new(Counter { count: 3 }), None, summary)
            .unwrap();
        assert_eq!(line, r#"{"phase":"idle","data":{"count":3}}"#);
    }
}
