use std::{
    collections::HashMap,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use types::{Oracle, OracleError, OracleResponse};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Unable to read fixtures from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unable to parse fixtures: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One line of a YAML fixture file.
///
/// ```yaml
/// - player: Tony Adams
///   club: Arsenal
///   appearances: 669
/// - player: Lionel Messi
///   club: Arsenal
///   explanation: Never played in England
/// - player: Flaky Name
///   club: Arsenal
///   unavailable: true
/// ```
#[derive(Debug, Deserialize)]
struct FixtureEntry {
    player: String,
    club: String,
    appearances: Option<i64>,
    explanation: Option<String>,
    source_url: Option<String>,
    #[serde(default)]
    unavailable: bool,
}

/// Answers from a fixed table. Names it has never heard of are rejected.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: HashMap<(String, String), Result<OracleResponse, OracleError>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, player: &str, club: &str, response: OracleResponse) -> Self {
        self.answers.insert(table_key(player, club), Ok(response));
        self
    }

    pub fn with_valid(self, player: &str, club: &str, appearances: i64) -> Self {
        self.with_answer(player, club, OracleResponse::valid(appearances))
    }

    pub fn with_invalid(self, player: &str, club: &str, explanation: &str) -> Self {
        self.with_answer(player, club, OracleResponse::invalid(explanation))
    }

    pub fn with_unavailable(mut self, player: &str, club: &str) -> Self {
        self.answers.insert(
            table_key(player, club),
            Err(OracleError::Unavailable("scripted outage".to_string())),
        );
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, FixtureError> {
        let entries: Vec<FixtureEntry> = serde_yaml::from_str(yaml)?;
        let oracle = entries
            .into_iter()
            .fold(Self::new(), |oracle, entry| {
                if entry.unavailable {
                    return oracle.with_unavailable(&entry.player, &entry.club);
                }
                let response = OracleResponse {
                    is_valid: Some(entry.appearances.is_some() && entry.explanation.is_none()),
                    appearances: entry.appearances,
                    explanation: entry.explanation,
                    source_url: entry.source_url,
                };
                oracle.with_answer(&entry.player, &entry.club, response)
            });
        log::info!("Loaded {} scripted answers", oracle.answers.len());
        Ok(oracle)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, FixtureError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// How many times `verify` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn table_key(player: &str, club: &str) -> (String, String) {
    let fold = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    (fold(player), fold(club))
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn verify(
        &self,
        player_name: &str,
        club_name: &str,
    ) -> Result<OracleResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .get(&table_key(player_name, club_name))
            .cloned()
            .unwrap_or_else(|| {
                Ok(OracleResponse {
                    is_valid: Some(false),
                    ..Default::default()
                })
            });
        log::debug!("Scripted answer for {player_name} at {club_name}: {answer:?}");
        answer
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
