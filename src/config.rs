use std::{env, path::PathBuf, sync::Arc, time::Duration};

use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::core::{FieldOptions, FieldRegistry, FilterRuleField, Operator, TableColumn};
use crate::editor::{RuleEditor, SearchField, SortDirection, SortItem};
use crate::services::TableQueryState;

const CONFIG: &str = include_str!("../.config/config.json5");
const CONFIG_FILE: &str = "config.json5";

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

/// Editor flags for one field, keyed by field name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "json_schema", schemars(deny_unknown_fields))]
pub struct FieldOptionsEntry {
    pub field: String,
    #[serde(default)]
    pub disable_update_debounce: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "json_schema", schemars(with = "Option<String>"))]
    pub force_operator: Option<Operator>,
}

impl From<&FieldOptionsEntry> for FieldOptions {
    fn from(entry: &FieldOptionsEntry) -> Self {
        FieldOptions {
            disable_update_debounce: entry.disable_update_debounce,
            force_operator: entry.force_operator.clone(),
            ..FieldOptions::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "json_schema", schemars(deny_unknown_fields))]
pub struct Config {
    /// Quiet period before a rule value edit is published
    #[serde(default = "default_rule_debounce_ms")]
    pub rule_debounce_ms: u64,
    /// Quiet period before fulltext input is published
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_paging_options")]
    pub paging_options: Vec<usize>,
    #[serde(default)]
    pub paging_default: Option<usize>,
    #[serde(default = "default_backend_sort")]
    pub backend_default_sort: Vec<SortItem>,
    /// Explicit filter fields. When empty they are derived from `columns`.
    #[serde(default)]
    pub fields: Vec<FilterRuleField>,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub field_options: Vec<FieldOptionsEntry>,
}

fn default_rule_debounce_ms() -> u64 {
    500
}

fn default_search_debounce_ms() -> u64 {
    1000
}

fn default_paging_options() -> Vec<usize> {
    vec![25, 75, 200]
}

fn default_backend_sort() -> Vec<SortItem> {
    vec![SortItem::new("id", SortDirection::Desc)]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_debounce_ms: default_rule_debounce_ms(),
            search_debounce_ms: default_search_debounce_ms(),
            paging_options: default_paging_options(),
            paging_default: None,
            backend_default_sort: default_backend_sort(),
            fields: Vec::new(),
            columns: Vec::new(),
            field_options: Vec::new(),
        }
    }
}

impl Config {
    /// Embedded defaults overlaid with the user file. An explicit path must
    /// exist; the file in the config folder is optional.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        builder = match config_path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                builder.add_source(
                    config::File::from(expand_tilde(path))
                        .format(config::FileFormat::Json5)
                        .required(true),
                )
            }
            None => {
                let path = get_config_dir().join(CONFIG_FILE);
                debug!(path = %path.display(), "loading optional config");
                builder.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Json5)
                        .required(false),
                )
            }
        };

        let cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.paging_options.is_empty() {
            return Err(config::ConfigError::Message(
                "paging_options must not be empty".to_string(),
            ));
        }
        Ok(cfg)
    }

    pub fn rule_debounce(&self) -> Duration {
        Duration::from_millis(self.rule_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Rule editor over `registry` using the configured value debounce
    pub fn rule_editor(&self, registry: Arc<FieldRegistry>) -> RuleEditor {
        RuleEditor::new(registry).with_debounce(self.rule_debounce())
    }

    /// Search input using the configured fulltext debounce. Needs a tokio runtime.
    pub fn search_field(&self) -> (SearchField, UnboundedReceiver<Option<String>>) {
        SearchField::new(self.search_debounce())
    }

    /// Page size for the first page event; falls back to the first option
    pub fn paging_default(&self) -> usize {
        self.paging_default
            .or_else(|| self.paging_options.first().copied())
            .unwrap_or(25)
    }

    pub fn registry(&self) -> FieldRegistry {
        let mut registry = if self.fields.is_empty() {
            FieldRegistry::from_columns(&self.columns)
        } else {
            FieldRegistry::new(self.fields.clone())
        };
        for entry in &self.field_options {
            registry.set_options(entry.field.clone(), FieldOptions::from(entry));
        }
        registry
    }

    pub fn query_state(&self) -> TableQueryState {
        TableQueryState::new(Arc::new(self.registry()))
            .with_backend_default_sort(self.backend_default_sort.clone())
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.clone();
    };
    match directories::BaseDirs::new() {
        Some(home) => home.home_dir().join(stripped),
        None => path.clone(),
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}
