use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/phishguard.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sandbox: SandboxConfig,
    pub model: ModelConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Wall-clock budget for one sandboxed file analysis.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub enabled: bool,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sandbox: SandboxConfig { timeout_seconds: 30 },
            model: ModelConfig {
                enabled: false,
                manifest_path: "models/model.json".to_string(),
            },
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.sandbox.timeout_seconds, 30);
        assert!(!config.model.enabled);
        assert_eq!(config.model.manifest_path, "models/model.json");
        assert_eq!(config.logging.unwrap().level, "info");
    }

    #[test]
    fn test_yaml_round_trip() {
        let path = std::env::temp_dir().join("phishguard_test_config.yaml");
        let config = Config::default();
        config.to_file(path.to_str().unwrap()).unwrap();

        let loaded = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.sandbox.timeout_seconds, config.sandbox.timeout_seconds);
        assert_eq!(loaded.model.enabled, config.model.enabled);
        assert_eq!(loaded.model.manifest_path, config.model.manifest_path);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_minimal_yaml_parses() {
        let yaml = "sandbox:\n  timeout_seconds: 5\nmodel:\n  enabled: true\n  manifest_path: \"m.json\"\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.sandbox.timeout_seconds, 5);
        assert!(config.model.enabled);
        assert!(config.logging.is_none());
    }
}
