//! Everything the commands print on stdout goes through [`OutputManager`].

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{AnsiColors, OwoColorize};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Writes command results to stdout in the resolved format.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// `--output-format` wins over `output.format` unless left at `auto`.
    /// Colours are only used for human output.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => {
                OutputFormat::from_config(&config.output.format).unwrap_or(OutputFormat::Auto)
            }
            explicit => explicit,
        };
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    fn emit(&self, line: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(line)
    }

    /// `<symbol> <msg>`, coloured when colours are on.
    fn status(&self, symbol: char, msg: &str, colour: AnsiColors) -> io::Result<()> {
        if self.no_color {
            return self.emit(&format!("{symbol} {msg}"));
        }
        self.emit(&format!(
            "{} {}",
            symbol.color(colour).bold(),
            msg.color(colour)
        ))
    }

    /// Suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        self.emit(msg)
    }

    /// Payload a script may consume, such as a typelist or a name list.
    /// Printed even in quiet mode.
    pub fn data(&self, msg: &str) -> io::Result<()> {
        self.term.write_line(msg)
    }

    /// Pretty-printed JSON document, printed even in quiet mode.
    pub fn json(&self, value: &serde_json::Value) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.status('\u{2713}', msg, AnsiColors::Green)
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.status('\u{26a0}', msg, AnsiColors::Yellow)
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.status('\u{2139}', msg, AnsiColors::Blue)
    }

    /// Section title, e.g. a task name.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.no_color {
            self.emit(text)
        } else {
            self.emit(&text.cyan().bold().to_string())
        }
    }

    /// Indented line under the last header.
    pub fn detail(&self, text: &str) -> io::Result<()> {
        if self.no_color {
            self.emit(&format!("    {text}"))
        } else {
            self.emit(&format!("    {}", text.dimmed()))
        }
    }

    /// Progress bar over `len` steps, hidden unless a human is watching.
    pub fn progress(&self, len: u64) -> ProgressBar {
        if self.quiet || self.resolved_format != OutputFormat::Human || !self.term.is_term() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manager(quiet: bool, no_color: bool, format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            log_file: None,
            output_format: format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
    }

    #[test]
    fn colours_only_for_human_output() {
        assert!(!make_manager(false, false, OutputFormat::Human).no_color);
        assert!(make_manager(false, true, OutputFormat::Human).no_color);
        assert!(make_manager(false, false, OutputFormat::Plain).no_color);
    }

    #[test]
    fn explicit_format_is_kept() {
        let out = make_manager(false, false, OutputFormat::Json);
        assert_eq!(out.resolved_format, OutputFormat::Json);
        assert!(out.is_json());
    }

    #[test]
    fn config_format_applies_when_flag_is_auto() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            log_file: None,
            output_format: OutputFormat::Auto,
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        assert!(OutputManager::new(&args, &config).is_json());
    }

    #[test]
    fn progress_is_hidden_when_not_human() {
        let out = make_manager(false, true, OutputFormat::Plain);
        assert!(out.progress(3).is_hidden());
    }
}
