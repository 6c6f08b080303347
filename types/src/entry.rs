use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Seat;

/// A committed move: a name that was accepted and scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    pub appearances: u32,
    pub added_by: Seat,
    /// Position in creation order, starting at 0 for the first accepted name.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub source_url: Option<String>,
}

impl PlayerEntry {
    pub fn same_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl Display for PlayerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} +{} ({})",
            self.name, self.appearances, self.added_by
        )?;
        if let Some(url) = &self.source_url {
            write!(f, " [{url}]")?;
        }
        Ok(())
    }
}
