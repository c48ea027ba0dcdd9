use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "engine";

// nested keys use `__`, e.g. `SMA_SERVER__PORT`
pub const ENV_PREFIX: &str = "SMA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub id_column: String,
    pub label_column: String,
    // inclusive
    pub label_threshold: f64,
    pub test_size: f64,
    // fraction of the remaining rows held out for validation
    pub validation_size: f64,
    pub seed: u64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    // inverse L2 strength
    pub c: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("Students-Social-Media-Addiction.csv"),
            id_column: "student_id".to_string(),
            label_column: "addicted_score".to_string(),
            label_threshold: 7.0,
            test_size: 0.2,
            validation_size: 0.25,
            seed: 42,
            learning_rate: 0.1,
            max_iter: 5000,
            tolerance: 1e-6,
            c: 1.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let training = &self.training;
        for (name, value) in [
            ("training.test_size", training.test_size),
            ("training.validation_size", training.validation_size),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "{} must be in (0, 1), got {}",
                    name, value
                ))));
            }
        }
        if training.learning_rate <= 0.0 || training.c <= 0.0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "training.learning_rate and training.c must be positive".to_string(),
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.training.seed, 42);
    }

    #[test]
    fn test_rejects_out_of_range_split() {
        let mut config = Config::default();
        config.training.test_size = 1.5;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_layered_sources_override_defaults() {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default()).unwrap())
            .set_override("server.port", 9100_i64)
            .unwrap()
            .set_override("training.seed", 7_i64)
            .unwrap()
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.label_column, "addicted_score");
    }
}
