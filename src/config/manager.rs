use super::{search::SearchConfig, traits::ConfigSection};
use crate::error::LabelcraftError;
use crate::labeling::builtin::Aggregation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

const ENV_PREFIX: &str = "LABELCRAFT";

/// Names of the entity-key and timestamp columns in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub entity: String,
    pub time: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            entity: "entity_id".to_string(),
            time: "time".to_string(),
        }
    }
}

impl ConfigSection for ColumnConfig {
    fn section_name() -> &'static str {
        "columns"
    }

    fn validate(&self) -> Result<(), LabelcraftError> {
        if self.entity.trim().is_empty() {
            return Err(LabelcraftError::invalid("columns.entity", "column name is empty"));
        }
        if self.time.trim().is_empty() {
            return Err(LabelcraftError::invalid("columns.time", "column name is empty"));
        }
        if self.entity == self.time {
            return Err(LabelcraftError::invalid(
                "columns.time",
                format!("'{}' is also the entity column", self.time),
            ));
        }
        Ok(())
    }
}

/// Built-in labeling function used by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub aggregation: Aggregation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Count,
            column: None,
        }
    }
}

impl ConfigSection for LabelConfig {
    fn section_name() -> &'static str {
        "label"
    }

    fn validate(&self) -> Result<(), LabelcraftError> {
        if self.aggregation.needs_column() && self.column.is_none() {
            return Err(LabelcraftError::invalid(
                "label.column",
                format!("aggregation '{}' needs a column", self.aggregation.name()),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub label: LabelConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), LabelcraftError> {
        self.columns.validate_section()?;
        self.search.validate_section()?;
        self.label.validate_section()?;
        Ok(())
    }

    /// Parse TOML text without environment overrides.
    pub fn from_toml_str(text: &str) -> Result<Self, LabelcraftError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Layer a TOML or JSON file (picked by extension) with
    /// `LABELCRAFT__SECTION__KEY` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LabelcraftError> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!("Loaded configuration from {}", path.display());
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LabelcraftError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| LabelcraftError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| LabelcraftError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` and keep the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), LabelcraftError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
