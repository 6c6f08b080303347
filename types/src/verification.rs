use serde::{Deserialize, Serialize};

/// Message shown when the oracle could not be reached or answered garbage.
pub const SERVICE_BUSY_MESSAGE: &str = "Verification service busy. Please try again.";

/// A conclusive answer about whether a player appeared for a club.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationResult {
    Valid {
        appearances: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
    Invalid {
        error: String,
    },
}

impl VerificationResult {
    pub fn valid(appearances: u32) -> Self {
        VerificationResult::Valid {
            appearances,
            source_url: None,
        }
    }

    pub fn invalid(error: &str) -> Self {
        VerificationResult::Invalid {
            error: error.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid { .. })
    }

    pub fn appearances(&self) -> Option<u32> {
        match self {
            VerificationResult::Valid { appearances, .. } => Some(*appearances),
            VerificationResult::Invalid { .. } => None,
        }
    }

    /// A valid result must carry at least one appearance.
    pub fn is_well_formed(&self) -> bool {
        match self {
            VerificationResult::Valid { appearances, .. } => *appearances >= 1,
            VerificationResult::Invalid { .. } => true,
        }
    }
}

/// The oracle's answer as it came off the wire, before any normalization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleResponse {
    pub is_valid: Option<bool>,
    pub appearances: Option<i64>,
    pub explanation: Option<String>,
    pub source_url: Option<String>,
}

impl OracleResponse {
    pub fn valid(appearances: i64) -> Self {
        Self {
            is_valid: Some(true),
            appearances: Some(appearances),
            ..Default::default()
        }
    }

    pub fn invalid(explanation: &str) -> Self {
        Self {
            is_valid: Some(false),
            appearances: Some(0),
            explanation: Some(explanation.to_string()),
            source_url: None,
        }
    }

    pub fn with_source(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }

    /// Whether the oracle actually took a position on validity. Only such
    /// answers are facts worth caching.
    pub fn is_conclusive(&self) -> bool {
        self.is_valid.is_some()
    }

    pub fn normalize(&self, player_name: &str, club_name: &str) -> VerificationResult {
        let appearances = self
            .appearances
            .filter(|&n| n >= 1)
            .and_then(|n| u32::try_from(n).ok());
        match (self.is_valid, appearances) {
            (Some(true), Some(appearances)) => VerificationResult::Valid {
                appearances,
                source_url: self.source_url.clone(),
            },
            _ => {
                let error = self
                    .explanation
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| unverified_message(player_name, club_name));
                VerificationResult::Invalid { error }
            }
        }
    }
}

pub fn unverified_message(player_name: &str, club_name: &str) -> String {
    format!("Could not verify {player_name} played for {club_name}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_response_keeps_citation() {
        let response = OracleResponse::valid(669).with_source("https://example.org/adams");
        assert_eq!(
            response.normalize("Tony Adams", "Arsenal"),
            VerificationResult::Valid {
                appearances: 669,
                source_url: Some("https://example.org/adams".to_string()),
            }
        );
    }

    #[test]
    fn test_zero_appearances_is_invalid() {
        let response = OracleResponse {
            is_valid: Some(true),
            appearances: Some(0),
            ..Default::default()
        };
        assert_eq!(
            response.normalize("Nobody", "Arsenal"),
            VerificationResult::invalid("Could not verify Nobody played for Arsenal.")
        );
    }

    #[test]
    fn test_missing_appearances_is_invalid() {
        let response = OracleResponse {
            is_valid: Some(true),
            appearances: None,
            explanation: Some("No data found".to_string()),
            source_url: None,
        };
        assert_eq!(
            response.normalize("Someone", "Chelsea"),
            VerificationResult::invalid("No data found")
        );
    }

    #[test]
    fn test_negative_appearances_is_invalid() {
        let response = OracleResponse::valid(-4);
        assert!(!response.normalize("Someone", "Chelsea").is_valid());
    }

    #[test]
    fn test_invalid_uses_explanation_or_fallback() {
        let explained = OracleResponse::invalid("Never signed for the club");
        assert_eq!(
            explained.normalize("Pele", "Everton"),
            VerificationResult::invalid("Never signed for the club")
        );

        let blank = OracleResponse::invalid("   ");
        assert_eq!(
            blank.normalize("Pele", "Everton"),
            VerificationResult::invalid("Could not verify Pele played for Everton.")
        );
    }

    #[test]
    fn test_conclusive_requires_is_valid() {
        assert!(OracleResponse::valid(3).is_conclusive());
        assert!(OracleResponse::invalid("no").is_conclusive());
        assert!(!OracleResponse::default().is_conclusive());
    }

    #[test]
    fn test_result_serialization_shape() {
        let json = serde_json::to_value(VerificationResult::valid(12)).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "valid", "appearances": 12}));

        let parsed: VerificationResult =
            serde_json::from_str(r#"{"outcome":"invalid","error":"nope"}"#).unwrap();
        assert_eq!(parsed, VerificationResult::invalid("nope"));
    }

    #[test]
    fn test_well_formed() {
        assert!(VerificationResult::valid(1).is_well_formed());
        assert!(!VerificationResult::valid(0).is_well_formed());
        assert!(VerificationResult::invalid("x").is_well_formed());
    }
}
