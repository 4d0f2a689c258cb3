use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logic::{SortProperty, MEMBER_LIST_STORAGE_KEY};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub lists: ListsConfig,
    pub motions: MotionsConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per persisted filter key
    pub state_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListsConfig {
    pub member_storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionsConfig {
    pub default_sorting: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub members_path: Option<String>,
    pub meetings_path: Option<String>,
    pub committees_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: ".assembly-lists".to_string(),
        }
    }
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            member_storage_key: MEMBER_LIST_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for MotionsConfig {
    fn default() -> Self {
        Self {
            default_sorting: SortProperty::default().to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables with prefix "ASSEMBLY_", e.g. ASSEMBLY_STORAGE__STATE_DIR
        config = config.add_source(
            config::Environment::with_prefix("ASSEMBLY")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    pub fn state_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.state_dir)
    }

    /// Configured motion sort property
    pub fn motion_sort_property(&self) -> anyhow::Result<SortProperty> {
        Ok(self.motions.default_sorting.parse()?)
    }
}
