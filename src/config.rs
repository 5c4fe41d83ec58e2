//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treepager/treepager.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `TREEPAGER_*` prefix
//! 5. Command line flags (applied by the CLI)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DatasourceOptions;
use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, EmptyPagePolicy, ExpansionMode, NodeSchema};

/// Default dataset endpoint.
pub const DEFAULT_SOURCE: &str = "https://www.ag-grid.com/example-assets/tree-data.json";

/// Raw schema config for intermediate parsing (Option detects "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSchema {
    pub key_fields: Option<Vec<String>>,
    pub children_field: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub source: Option<String>,
    pub latency_ms: Option<u64>,
    pub page_size: Option<usize>,
    pub expansion: Option<ExpansionMode>,
    pub empty_page: Option<EmptyPagePolicy>,
    pub schema: RawSchema,
}

/// Unified configuration for treepager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Dataset URL or JSON file path
    pub source: String,
    /// Simulated latency per response and per push
    pub latency_ms: u64,
    /// Rows per page when no end index is given
    pub page_size: usize,
    pub expansion: ExpansionMode,
    pub empty_page: EmptyPagePolicy,
    /// Field names used to decode nodes
    pub schema: NodeSchema,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.into(),
            latency_ms: 200,
            page_size: 100,
            expansion: ExpansionMode::default(),
            empty_page: EmptyPagePolicy::default(),
            schema: NodeSchema::default(),
        }
    }
}

/// Get the XDG config directory for treepager.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treepager").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treepager.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Ordered union with negation: overlay items are appended unless already
/// present, `!name` removes `name`. Order matters for key fields, so this
/// keeps first-seen order instead of sorting.
pub fn merge_ordered(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: Vec<String> = base.to_vec();
    for item in overlay {
        if let Some(negated) = item.strip_prefix('!') {
            result.retain(|existing| existing != negated);
        } else if !result.contains(item) {
            result.push(item.clone());
        }
    }
    result
}

impl Settings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn datasource_options(&self) -> DatasourceOptions {
        DatasourceOptions {
            latency: self.latency(),
            empty_page: self.empty_page,
            expansion: self.expansion,
        }
    }

    /// Expand shell variables and tilde in the source when it is a path.
    fn expand_paths(&mut self) {
        if !self.source.contains("://") {
            self.source = expand_env_vars(&self.source);
        }
    }

    /// Global config: scalars and arrays REPLACE the defaults.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let mut applied = self.scalars_from(global);
        if let Some(fields) = &global.schema.key_fields {
            applied.schema.key_fields = fields.clone();
        }
        applied
    }

    /// Local config: scalars override, key fields UNION with negation.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut merged = self.scalars_from(overlay);
        if let Some(fields) = &overlay.schema.key_fields {
            merged.schema.key_fields = merge_ordered(&self.schema.key_fields, fields);
        }
        merged
    }

    fn scalars_from(&self, raw: &RawSettings) -> Self {
        Self {
            source: raw.source.clone().unwrap_or_else(|| self.source.clone()),
            latency_ms: raw.latency_ms.unwrap_or(self.latency_ms),
            page_size: raw.page_size.unwrap_or(self.page_size),
            expansion: raw.expansion.unwrap_or(self.expansion),
            empty_page: raw.empty_page.unwrap_or(self.empty_page),
            schema: NodeSchema {
                key_fields: self.schema.key_fields.clone(),
                children_field: raw
                    .schema
                    .children_field
                    .clone()
                    .unwrap_or_else(|| self.schema.children_field.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional config file given on the command line
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: ordered UNION with `!name` negation
    /// - Any → Env vars: REPLACE
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_config, env_source())
    }

    /// Layered load with every source explicit.
    pub fn load_from(
        global_config: Option<&Path>,
        local_config: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(local_path) = local_config {
            if !local_path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", local_path.display()),
                });
            }
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "source")? {
            settings.source = val;
        }
        if let Some(val) = env_value::<u64>(&config, "latency_ms")? {
            settings.latency_ms = val;
        }
        if let Some(val) = env_value::<usize>(&config, "page_size")? {
            settings.page_size = val;
        }
        if let Some(val) = env_value::<String>(&config, "expansion")? {
            settings.expansion = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Some(val) = env_value::<String>(&config, "empty_page")? {
            settings.empty_page = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Some(val) = env_value::<Vec<String>>(&config, "schema.key_fields")? {
            settings.schema.key_fields = val;
        }
        if let Some(val) = env_value::<String>(&config, "schema.children_field")? {
            settings.schema.children_field = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treepager configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/treepager/treepager.toml
#   Local:  file passed with --config
#   Env:    TREEPAGER_* environment variables (TREEPAGER_SCHEMA__KEY_FIELDS=a,b)
#
# key_fields in a local config UNION with the global list; "!name" removes
# an inherited entry. Order matters: the first field present wins.

# Dataset URL or JSON file
# source = "https://www.ag-grid.com/example-assets/tree-data.json"

# Simulated latency per response and per pushed batch
# latency_ms = 200

# Rows per page when --end is not given
# page_size = 100

# lazy: children on expansion; prefetch: push whole subtrees after each page
# expansion = "lazy"

# fail: an empty page is reported as no data; succeed: zero rows plus total
# empty_page = "fail"

[schema]
# key_fields = ["group_key", "test_suite", "test_case_name"]
# children_field = "child_nodes"
"#
        .to_string()
    }
}

/// `TREEPAGER_*` environment source.
pub fn env_source() -> Environment {
    Environment::with_prefix("TREEPAGER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("schema.key_fields")
}

/// A typed env value; only an unset key counts as absent.
fn env_value<T: serde::de::DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None, env(&[])).expect("load defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.latency(), Duration::from_millis(200));
    }

    #[test]
    fn given_env_overrides_when_loading_then_replace_values() {
        let settings = Settings::load_from(
            None,
            None,
            env(&[
                ("TREEPAGER_LATENCY_MS", "5"),
                ("TREEPAGER_EXPANSION", "prefetch"),
                ("TREEPAGER_SCHEMA__KEY_FIELDS", "name,id"),
                ("TREEPAGER_SCHEMA__CHILDREN_FIELD", "testcases"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.latency_ms, 5);
        assert_eq!(settings.expansion, ExpansionMode::Prefetch);
        assert_eq!(settings.schema.key_fields, vec!["name", "id"]);
        assert_eq!(settings.schema.children_field, "testcases");
    }

    #[test]
    fn given_bad_env_mode_when_loading_then_config_error() {
        let err = Settings::load_from(None, None, env(&[("TREEPAGER_EMPTY_PAGE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Config { .. }));
    }

    #[test]
    fn given_non_numeric_env_latency_when_loading_then_config_error() {
        let err = Settings::load_from(None, None, env(&[("TREEPAGER_LATENCY_MS", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Config { .. }));
    }

    #[test]
    fn given_tilde_in_source_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            source: "~/data/tree.json".into(),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.source.starts_with(&home));
    }

    #[test]
    fn given_url_source_when_expand_paths_then_unchanged() {
        let mut settings = Settings::default();
        settings.expand_paths();
        assert_eq!(settings.source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_merge_ordered_keeps_order_and_negates() {
        let base = vec!["group_key".to_string(), "test_suite".to_string()];
        let overlay = vec!["name".to_string(), "!group_key".to_string(), "test_suite".to_string()];

        let result = merge_ordered(&base, &overlay);

        assert_eq!(result, vec!["test_suite", "name"]);
    }

    #[test]
    fn test_apply_global_replaces_key_fields() {
        let global = RawSettings {
            latency_ms: Some(10),
            schema: RawSchema {
                key_fields: Some(vec!["name".into()]),
                children_field: None,
            },
            ..RawSettings::default()
        };

        let result = Settings::default().apply_global(&global);

        assert_eq!(result.latency_ms, 10);
        assert_eq!(result.schema.key_fields, vec!["name"]);
        assert_eq!(result.schema.children_field, "child_nodes");
    }

    #[test]
    fn test_template_parses_as_settings() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.source.is_none());
    }
}
