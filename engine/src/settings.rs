use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use database::{DatabaseConfig, DatabaseError, SqliteVerificationCache, VerificationCache};
use oracles::{FixtureError, GeminiConfig, GeminiOracle, RefereeOracle, ScriptedOracle};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::{Club, Oracle};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unable to read settings from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No API key found in ${0} or $API_KEY")]
    MissingApiKey(String),

    #[error("The scripted oracle needs a fixtures file")]
    MissingFixtures,

    #[error(transparent)]
    Fixtures(#[from] FixtureError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Unable to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    Gemini,
    Scripted,
    Referee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the key, never the key itself.
    pub api_key_env: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: oracles::gemini::DEFAULT_MODEL.to_string(),
            endpoint: oracles::gemini::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: oracles::gemini::DEFAULT_TIMEOUT.as_secs(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    pub oracle: OracleKind,
    pub gemini: GeminiSettings,
    pub fixtures: Option<PathBuf>,
    pub clubs: Vec<Club>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            oracle: OracleKind::Gemini,
            gemini: GeminiSettings::default(),
            fixtures: None,
            clubs: Club::default_catalog(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_yaml::from_str(yaml)?;
        if settings.clubs.is_empty() {
            settings.clubs = Club::default_catalog();
        }
        Ok(settings)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Finds a club by id or by name, ignoring case.
    pub fn find_club(&self, query: &str) -> Option<&Club> {
        let query = query.trim().to_lowercase();
        self.clubs
            .iter()
            .find(|club| club.id.to_lowercase() == query || club.name.to_lowercase() == query)
    }

    pub fn api_key(&self) -> Result<String, SettingsError> {
        std::env::var(&self.gemini.api_key_env)
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| SettingsError::MissingApiKey(self.gemini.api_key_env.clone()))
    }

    pub fn build_oracle(&self) -> Result<Arc<dyn Oracle>, SettingsError> {
        let oracle: Arc<dyn Oracle> = match self.oracle {
            OracleKind::Gemini => {
                let config = GeminiConfig {
                    api_key: self.api_key()?,
                    model: self.gemini.model.clone(),
                    endpoint: self.gemini.endpoint.clone(),
                    timeout: Duration::from_secs(self.gemini.timeout_secs),
                };
                Arc::new(GeminiOracle::new(config)?)
            }
            OracleKind::Scripted => {
                let path = self.fixtures.as_ref().ok_or(SettingsError::MissingFixtures)?;
                Arc::new(ScriptedOracle::from_yaml_file(path)?)
            }
            OracleKind::Referee => Arc::new(RefereeOracle::default()),
        };
        log::info!("Using the {} oracle", oracle.name());
        Ok(oracle)
    }

    pub async fn build_cache(
        &self,
        cli_url: Option<String>,
    ) -> Result<Arc<dyn VerificationCache>, SettingsError> {
        let config = DatabaseConfig::from_cli_or_env_or_yaml(cli_url, self.database_url.clone());
        let cache = SqliteVerificationCache::new(config.create_pool().await?);
        cache.run_migrations().await?;
        Ok(Arc::new(cache))
    }
}
