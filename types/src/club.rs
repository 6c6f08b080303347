use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub league: String,
}

impl Club {
    pub fn new(id: &str, name: &str, league: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            league: league.to_string(),
        }
    }

    /// Clubs offered when no catalog is configured.
    pub fn default_catalog() -> Vec<Club> {
        [
            ("arsenal", "Arsenal", "Premier League"),
            ("aston-villa", "Aston Villa", "Premier League"),
            ("chelsea", "Chelsea", "Premier League"),
            ("everton", "Everton", "Premier League"),
            ("liverpool", "Liverpool", "Premier League"),
            ("man-city", "Manchester City", "Premier League"),
            ("man-utd", "Manchester United", "Premier League"),
            ("newcastle", "Newcastle United", "Premier League"),
            ("spurs", "Tottenham Hotspur", "Premier League"),
            ("west-ham", "West Ham United", "Premier League"),
            ("leeds", "Leeds United", "Championship"),
            ("sunderland", "Sunderland", "Championship"),
        ]
        .iter()
        .map(|&(id, name, league)| Club::new(id, name, league))
        .collect()
    }
}

impl Display for Club {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.league)
    }
}
