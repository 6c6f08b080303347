use std::{fmt::Display, sync::OnceLock};

use regex::Regex;

/// Bump the version prefix whenever the stored payload shape changes; old
/// entries then simply stop being found.
pub const CACHE_NAMESPACE: &str = "v1_player_cache";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(player_name: &str, club_name: &str) -> Self {
        Self(format!(
            "{CACHE_NAMESPACE}:{}:{}",
            normalize_token(player_name),
            normalize_token(club_name)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lower-cases and collapses each run of whitespace to a single `_`.
pub fn normalize_token(raw: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RE
        .get_or_init(|| Regex::new(r"\s+").expect("Valid whitespace regex"))
        .replace_all(raw.trim(), "_")
        .to_lowercase()
}
