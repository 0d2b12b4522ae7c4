//! CLI-level errors.
//!
//! Everything a command can fail with ends up as a [`CliError`]. `main`
//! renders it on stderr together with hints for the user, then exits with
//! the code of its [`ErrorCategory`].

use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use taskforge_core::error::{ErrorCategory as CoreCategory, ForgeError};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// The user gave something the command cannot work with.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// The project file given on the command line does not exist.
    #[error("Project file not found: {path}")]
    ProjectFileNotFound { path: PathBuf },

    /// `--task` named a task the project does not define.
    #[error("Project '{project}' has no task '{name}'")]
    TaskNotFound {
        name: String,
        project: String,
        available: Vec<String>,
    },

    /// Reading, parsing or writing the configuration failed.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// Loading or generating failed inside the core or an adapter.
    #[error(transparent)]
    Core(#[from] ForgeError),

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

/// How an error is reported, and the process exit code it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad declaration, flag or value. Exit code 2.
    UserError,
    /// Missing project, task, typekit or type. Exit code 3.
    NotFound,
    /// Unusable configuration. Exit code 4.
    Configuration,
    /// Everything else. Exit code 1.
    Internal,
}

impl ErrorCategory {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Internal => 1,
            Self::UserError => 2,
            Self::NotFound => 3,
            Self::Configuration => 4,
        }
    }
}

impl From<CoreCategory> for ErrorCategory {
    fn from(category: CoreCategory) -> Self {
        match category {
            CoreCategory::Validation | CoreCategory::Compatibility => Self::UserError,
            CoreCategory::NotFound => Self::NotFound,
            CoreCategory::Internal => Self::Internal,
        }
    }
}

impl CliError {
    /// Wrap an `anyhow` error coming from the configuration layer.
    pub fn config(err: anyhow::Error) -> Self {
        CliError::ConfigError {
            message: format!("{err:#}"),
            source: None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::UserError,
            Self::ProjectFileNotFound { .. } | Self::TaskNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => core.category().into(),
            Self::IoError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.category().exit_code()
    }

    /// What the user can do about it.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { .. } => vec!["Run with --help to see the accepted values".into()],
            Self::ProjectFileNotFound { path } => vec![
                format!("No file at '{}'", path.display()),
                "Project files are named <project>.orogen.toml".into(),
            ],
            Self::TaskNotFound {
                project, available, ..
            } => {
                let mut hints = vec![format!("Tasks defined by '{project}':")];
                hints.extend(available.iter().map(|t| format!("  • {t}")));
                hints.push("List them with: taskforge list tasks <PROJECT_FILE>".into());
                hints
            }
            Self::ConfigError { .. } => vec![
                format!(
                    "Check the config file at {}",
                    crate::config::AppConfig::active_path().display()
                ),
                "Write a default one with 'taskforge init --force'".into(),
                "Inspect the effective values with 'taskforge config list'".into(),
            ],
            Self::Core(core) => core.suggestions(),
            Self::IoError { .. } => vec![
                "Check the permissions of the target directory".into(),
            ],
        }
    }

    /// Text for stderr. With `verbose`, every cause in the source chain is
    /// listed; `styled` adds ANSI colours.
    pub fn report(&self, verbose: bool, styled: bool) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "\n{} {}",
            paint(styled, "Error:", |t| t.red().bold().to_string()),
            paint(styled, &self.to_string(), |t| t.red().to_string())
        );

        if verbose {
            let mut cause = self.source();
            while let Some(err) = cause {
                let _ = writeln!(
                    out,
                    "  {}",
                    paint(styled, &format!("Caused by: {err}"), |t| t.dimmed().to_string())
                );
                cause = err.source();
            }
        }

        let hints = self.suggestions();
        if !hints.is_empty() {
            let _ = writeln!(
                out,
                "\n{}",
                paint(styled, "Suggestions:", |t| t.yellow().bold().to_string())
            );
            for hint in hints {
                let _ = writeln!(out, "  {hint}");
            }
        }

        if !verbose {
            let _ = writeln!(
                out,
                "\n{}",
                paint(styled, "Use -v / --verbose for more details.", |t| {
                    t.dimmed().to_string()
                })
            );
        }
        out
    }

    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::NotFound => {
                tracing::warn!(exit_code = self.exit_code(), "{self}")
            }
            ErrorCategory::Configuration | ErrorCategory::Internal => {
                tracing::error!(exit_code = self.exit_code(), "{self}")
            }
        }
        if let Some(source) = self.source() {
            tracing::debug!(%source, "caused by");
        }
    }
}

fn paint(styled: bool, text: &str, style: fn(&str) -> String) -> String {
    if styled { style(text) } else { text.to_owned() }
}

// ── IntoCli ───────────────────────────────────────────────────────────────────

/// Attach a context message while converting a foreign error.
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| CliError::IoError {
            message: f().into(),
            source,
        })
    }
}

impl<T> IntoCli<T> for Result<T, toml::ser::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::ConfigError {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
