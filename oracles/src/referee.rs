use std::io::{self, Write};

use async_trait::async_trait;
use regex::Regex;
use types::{Oracle, OracleError, OracleResponse};

/// A human at the terminal rules on each name.
///
/// Answers look like `y 669` (played, 669 appearances) or
/// `n never left Barcelona` (did not play, with an optional reason).
#[derive(Debug, Default)]
pub struct RefereeOracle {}

#[async_trait]
impl Oracle for RefereeOracle {
    async fn verify(
        &self,
        player_name: &str,
        club_name: &str,
    ) -> Result<OracleResponse, OracleError> {
        let question = format!("Referee: did {player_name} play for {club_name}? [y <apps> | n <reason>] >> ");
        tokio::task::spawn_blocking(move || ask_referee(&question))
            .await
            .map_err(|e| OracleError::Unavailable(format!("Referee prompt failed: {e}")))?
    }

    fn name(&self) -> &str {
        "referee"
    }
}

fn ask_referee(question: &str) -> Result<OracleResponse, OracleError> {
    let mut buf = String::new();
    loop {
        print!("{question}");
        let _ = io::stdout().flush();
        buf.clear();
        match io::stdin().read_line(&mut buf) {
            Ok(0) => return Err(OracleError::Unavailable("Referee left (stdin closed)".to_string())),
            Ok(_) => match parse_verdict(&buf) {
                Ok(response) => return Ok(response),
                Err(err) => log::error!("Error parsing verdict from stdin: {err}"),
            },
            Err(err) => {
                return Err(OracleError::Unavailable(format!(
                    "Error reading line from stdin: {err}"
                )))
            }
        }
    }
}

pub fn parse_verdict(input: &str) -> Result<OracleResponse, String> {
    let input = input.trim();

    let yes_re = Regex::new(r"(?i)^y(?:es)?\s+(?<apps>\d+)$").expect("Valid yes regex");
    if let Some(caps) = yes_re.captures(input) {
        let apps = caps
            .name("apps")
            .expect("apps is a required group")
            .as_str();
        let appearances: i64 = apps
            .parse()
            .map_err(|e| format!("Unable to read appearances from {apps:?}: {e}"))?;
        return Ok(OracleResponse::valid(appearances));
    }

    let no_re = Regex::new(r"(?i)^no?(?:\s+(?<reason>.+))?$").expect("Valid no regex");
    if let Some(caps) = no_re.captures(input) {
        let reason = caps.name("reason").map(|m| m.as_str().trim()).unwrap_or("");
        return Ok(OracleResponse {
            is_valid: Some(false),
            appearances: Some(0),
            explanation: (!reason.is_empty()).then(|| reason.to_string()),
            source_url: None,
        });
    }

    Err(format!(
        "Expected `y <appearances>` or `n [reason]`, got: {input:?}"
    ))
}
