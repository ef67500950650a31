use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    pub smi: SmiConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmiConfig {
    #[serde(default = "default_smi_binary")]
    pub binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination file for the rendered blob, e.g. a node-exporter
    /// textfile-collector directory entry; stdout when unset.
    #[serde(default)]
    pub textfile_path: Option<PathBuf>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            smi: SmiConfig {
                binary: default_smi_binary(),
            },
            output: OutputConfig {
                textfile_path: None,
            },
        }
    }
}

impl ExporterConfig {
    pub fn load() -> crate::error::Result<Self> {
        let config_path = Self::config_path();

        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&ExporterConfig::default())?)
            .add_source(config::File::from(config_path).required(false))
            .add_source(config::Environment::with_prefix("NVSMI").separator("_"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nvsmi-exporter")
            .join("config.toml")
    }
}

fn default_smi_binary() -> String {
    "nvidia-smi".to_string()
}
