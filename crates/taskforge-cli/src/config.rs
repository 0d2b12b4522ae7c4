//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate only sees the
//! [`GenerationOptions`] derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `TASKFORGE__<SECTION>__<KEY>`
//! 3. Config file: `--config`, else `.taskforge.toml` in the current
//!    directory, else the platform config directory
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use taskforge_core::application::GenerationOptions;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".taskforge.toml";

const ENV_PREFIX: &str = "TASKFORGE";
const ENV_SEPARATOR: &str = "__";
const OPTIONAL_KEYS: [&str; 1] = ["generation.template_dir"];
const PATH_LIST_KEYS: [&str; 3] = [
    "search.typekit_paths",
    "search.task_library_paths",
    "search.package_paths",
];

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where typekits, task libraries and packages are looked up.
    pub search: SearchConfig,
    /// Layout of the generated tree.
    pub generation: GenerationConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub typekit_paths: Vec<PathBuf>,
    pub task_library_paths: Vec<PathBuf>,
    pub package_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub automatic_area: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    pub fake_install: bool,
    pub save_user_templates: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = GenerationOptions::default();
        Self {
            automatic_area: defaults.automatic_area,
            template_dir: None,
            fake_install: defaults.fake_install,
            save_user_templates: defaults.save_user_templates,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl GenerationConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            automatic_area: self.automatic_area.clone(),
            fake_install: self.fake_install,
            save_user_templates: self.save_user_templates,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the
    /// environment.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// optional.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::active_path(), false),
        };
        Self::load_from(&path, required, Some(ENV_PREFIX))
    }

    /// Only the values of one file over the defaults, without the
    /// environment. This is what `config set` edits.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        Self::load_from(path, true, None)
    }

    fn load_from(path: &Path, required: bool, env_prefix: Option<&str>) -> anyhow::Result<Self> {
        if required && !path.is_file() {
            anyhow::bail!("config file '{}' does not exist", path.display());
        }

        let mut builder = config::Config::builder().add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(required),
        );
        if let Some(prefix) = env_prefix {
            let mut environment = config::Environment::with_prefix(prefix)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .list_separator(":")
                .try_parsing(true);
            for key in PATH_LIST_KEYS {
                environment = environment.with_list_parse_key(key);
            }
            builder = builder.add_source(environment);
        }

        builder
            .build()
            .with_context(|| format!("reading configuration from '{}'", path.display()))?
            .try_deserialize()
            .with_context(|| format!("invalid configuration in '{}'", path.display()))
    }

    /// Path to the platform configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to [`LOCAL_CONFIG_FILE`] in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("org", "taskforge", "taskforge")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// The file `load(None)` reads: the local file if present, otherwise the
    /// platform one.
    pub fn active_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            local
        } else {
            Self::config_path()
        }
    }

    /// The configuration as a TOML tree, for dotted-key access.
    pub fn to_value(&self) -> anyhow::Result<toml::Value> {
        toml::Value::try_from(self).context("serialising configuration")
    }

    /// Value of a dotted key such as `generation.fake_install`; `None` for
    /// an optional key that is unset.
    pub fn get(&self, key: &str) -> anyhow::Result<Option<toml::Value>> {
        let mut value = self.to_value()?;
        for part in key.split('.') {
            value = match value {
                toml::Value::Table(mut table) => match table.remove(part) {
                    Some(value) => value,
                    None if OPTIONAL_KEYS.contains(&key) => return Ok(None),
                    None => anyhow::bail!("unknown config key '{key}'"),
                },
                _ => anyhow::bail!("unknown config key '{key}'"),
            };
        }
        Ok(Some(value))
    }

    /// Return a copy with a dotted key replaced.
    ///
    /// `raw` is read as a TOML value when possible (`false`, `["a", "b"]`)
    /// and as a bare string otherwise. The result must still be a valid
    /// configuration, which also rejects unknown keys.
    pub fn with_value(&self, key: &str, raw: &str) -> anyhow::Result<Self> {
        let (section, leaf) = key
            .rsplit_once('.')
            .with_context(|| format!("unknown config key '{key}'"))?;

        let mut root = self.to_value()?;
        let mut table = root
            .as_table_mut()
            .context("configuration is not a table")?;
        for part in section.split('.') {
            table = table
                .get_mut(part)
                .and_then(toml::Value::as_table_mut)
                .with_context(|| format!("unknown config key '{key}'"))?;
        }
        let value = parse_value(raw, table.get(leaf));
        table.insert(leaf.to_string(), value);

        root.try_into::<AppConfig>()
            .with_context(|| format!("invalid value '{raw}' for '{key}'"))
    }
}

/// Unset optional keys are absent from the tree, so `current` may be `None`.
fn parse_value(raw: &str, current: Option<&toml::Value>) -> toml::Value {
    let parsed = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"));
    match (parsed, current) {
        (Some(value), Some(current)) if value.same_type(current) => value,
        (_, Some(toml::Value::Array(_))) => toml::Value::Array(
            raw.split(':')
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_generation_options() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.generation.options(), GenerationOptions::default());
        assert_eq!(cfg.generation.automatic_area, PathBuf::from(".orogen"));
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml"), false, None).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[search]\ntypekit_paths = [\"/opt/typekits\"]\n\n[generation]\nfake_install = false\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path, true, None).unwrap();
        assert_eq!(cfg.search.typekit_paths, [PathBuf::from("/opt/typekits")]);
        assert!(!cfg.generation.fake_install);
        assert!(cfg.generation.save_user_templates);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generation]\nautomatic = \"x\"\n").unwrap();
        assert!(AppConfig::load_from(&path, true, None).is_err());
    }

    #[test]
    fn get_dotted_key() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.get("generation.automatic_area").unwrap(),
            Some(toml::Value::String(".orogen".into()))
        );
        assert_eq!(
            cfg.get("output.no_color").unwrap(),
            Some(toml::Value::Boolean(false))
        );
        assert_eq!(cfg.get("generation.template_dir").unwrap(), None);
        assert!(cfg.get("does.not.exist").is_err());
    }

    #[test]
    fn with_value_parses_by_current_type() {
        let cfg = AppConfig::default()
            .with_value("generation.fake_install", "false")
            .unwrap()
            .with_value("search.typekit_paths", "/a:/b")
            .unwrap()
            .with_value("generation.automatic_area", "build")
            .unwrap();
        assert!(!cfg.generation.fake_install);
        assert_eq!(
            cfg.search.typekit_paths,
            [PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert_eq!(cfg.generation.automatic_area, PathBuf::from("build"));
    }

    #[test]
    fn with_value_rejects_bad_types_and_keys() {
        let cfg = AppConfig::default();
        assert!(cfg.with_value("generation.fake_install", "maybe").is_err());
        assert!(cfg.with_value("generation.nope", "1").is_err());
        assert!(cfg.with_value("nosection", "1").is_err());
    }

    #[test]
    fn with_value_sets_unset_optional_keys() {
        let cfg = AppConfig::default()
            .with_value("generation.template_dir", "/opt/templates")
            .unwrap();
        assert_eq!(
            cfg.generation.template_dir,
            Some(PathBuf::from("/opt/templates"))
        );
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
