//! Command-line grammar of `taskforge`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "taskforge",
    bin_name = "taskforge",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Component interface code generator",
    long_about = "Taskforge turns declarative component descriptions into a \
                  regenerated base class and a user class that is created once \
                  and never overwritten.",
    after_help = "EXAMPLES:\n\
        \x20 taskforge generate demo/demo.orogen.toml\n\
        \x20 taskforge generate demo/demo.orogen.toml --task Driver --dry-run\n\
        \x20 taskforge deps demo/demo.orogen.toml\n\
        \x20 taskforge typelist base -T /opt/typekits\n\
        \x20 taskforge completions bash > /usr/share/bash-completion/completions/taskforge",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the base and user files of every task in a project.
    #[command(
        visible_alias = "gen",
        about = "Generate task code",
        after_help = "EXAMPLES:\n\
            \x20 taskforge generate demo.orogen.toml\n\
            \x20 taskforge generate demo.orogen.toml --output build/demo\n\
            \x20 taskforge generate demo.orogen.toml --task Driver --task Monitor\n\
            \x20 taskforge generate demo.orogen.toml --dry-run"
    )]
    Generate(GenerateArgs),

    /// Show the typekits and task libraries each task depends on.
    #[command(
        about = "Show task dependencies",
        after_help = "EXAMPLES:\n\
            \x20 taskforge deps demo.orogen.toml\n\
            \x20 taskforge deps demo.orogen.toml --task Driver"
    )]
    Deps(DepsArgs),

    /// Print the typelist of a typekit.
    #[command(
        about = "Print a typekit's typelist",
        after_help = "EXAMPLES:\n\
            \x20 taskforge typelist base\n\
            \x20 taskforge typelist base --interface-only"
    )]
    Typelist(TypelistArgs),

    /// List typekits, task libraries or the tasks of a project.
    #[command(
        visible_alias = "ls",
        about = "List typekits, task libraries or tasks",
        after_help = "EXAMPLES:\n\
            \x20 taskforge list typekits\n\
            \x20 taskforge list libraries --format json\n\
            \x20 taskforge list tasks demo.orogen.toml"
    )]
    List(ListArgs),

    /// Initialise a taskforge configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 taskforge init           # platform config directory\n\
            \x20 taskforge init --local   # .taskforge.toml in the current directory"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 taskforge completions bash > ~/.local/share/bash-completion/completions/taskforge\n\
            \x20 taskforge completions zsh  > ~/.zfunc/_taskforge\n\
            \x20 taskforge completions fish > ~/.config/fish/completions/taskforge.fish"
    )]
    Completions(CompletionsArgs),

    /// Manage the taskforge configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 taskforge config get generation.automatic_area\n\
            \x20 taskforge config set generation.fake_install false\n\
            \x20 taskforge config list"
    )]
    Config(ConfigCommands),
}

// ── shared ────────────────────────────────────────────────────────────────────

/// Extra directories searched before the configured ones.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Directory holding `<name>.tlb` / `<name>.typelist` typekit files.
    #[arg(
        short = 'T',
        long = "typekit-path",
        global = true,
        value_name = "DIR",
        help = "Add a typekit search directory"
    )]
    pub typekit_paths: Vec<PathBuf>,

    /// Directory holding `<name>.orogen.toml` task library files.
    #[arg(
        short = 'L',
        long = "library-path",
        global = true,
        value_name = "DIR",
        help = "Add a task library search directory"
    )]
    pub task_library_paths: Vec<PathBuf>,

    /// Directory holding `<package>.toml` package manifests.
    #[arg(
        short = 'P',
        long = "package-path",
        global = true,
        value_name = "DIR",
        help = "Add a package manifest search directory"
    )]
    pub package_paths: Vec<PathBuf>,
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `taskforge generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Project declaration file.
    #[arg(value_name = "PROJECT_FILE", help = "Project file (<name>.orogen.toml)")]
    pub project: PathBuf,

    /// Directory receiving the generated tree.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory (default: the project file's directory)"
    )]
    pub output: Option<PathBuf>,

    /// Restrict generation to these tasks.
    #[arg(
        short = 't',
        long = "task",
        value_name = "NAME",
        help = "Only generate this task (repeatable)"
    )]
    pub tasks: Vec<String>,

    /// Run the whole pipeline without touching the disk.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,

    /// Directory of templates replacing the built-in ones.
    #[arg(
        long = "template-dir",
        value_name = "DIR",
        help = "Override the built-in templates"
    )]
    pub template_dir: Option<PathBuf>,

    /// Do not link headers into the fake install tree.
    #[arg(long = "no-fake-install", help = "Skip header links")]
    pub no_fake_install: bool,

    /// Do not keep a reference copy of fresh user files.
    #[arg(long = "no-user-templates", help = "Skip the user template mirror")]
    pub no_user_templates: bool,

    #[command(flatten)]
    pub search: SearchArgs,
}

// ── deps ──────────────────────────────────────────────────────────────────────

/// Arguments for `taskforge deps`.
#[derive(Debug, Args)]
pub struct DepsArgs {
    /// Project declaration file.
    #[arg(value_name = "PROJECT_FILE", help = "Project file (<name>.orogen.toml)")]
    pub project: PathBuf,

    /// Restrict the report to these tasks.
    #[arg(
        short = 't',
        long = "task",
        value_name = "NAME",
        help = "Only show this task (repeatable)"
    )]
    pub tasks: Vec<String>,

    #[command(flatten)]
    pub search: SearchArgs,
}

// ── typelist ──────────────────────────────────────────────────────────────────

/// Arguments for `taskforge typelist`.
#[derive(Debug, Args)]
pub struct TypelistArgs {
    /// Typekit name.
    #[arg(value_name = "TYPEKIT", help = "Typekit to inspect")]
    pub typekit: String,

    /// Leave out internal-only types.
    #[arg(long = "interface-only", help = "Only print interface types")]
    pub interface_only: bool,

    #[command(flatten)]
    pub search: SearchArgs,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `taskforge list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// What to list.
    #[command(subcommand)]
    pub what: ListTarget,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        global = true,
        help = "Output format"
    )]
    pub format: ListFormat,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// Things `taskforge list` can enumerate.
#[derive(Debug, Subcommand)]
pub enum ListTarget {
    /// Typekits found in the typekit search path.
    Typekits,
    /// Task libraries found in the task library search path.
    #[command(visible_alias = "libs")]
    Libraries,
    /// Tasks declared by a project, imported ones included.
    Tasks {
        /// Project declaration file.
        #[arg(value_name = "PROJECT_FILE")]
        project: PathBuf,
    },
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `taskforge init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write `.taskforge.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `taskforge completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `taskforge config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `generation.automatic_area`.
        key: String,
    },
    /// Set a configuration key in the configuration file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
