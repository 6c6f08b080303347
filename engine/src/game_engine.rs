use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use database::VerificationCache;
use types::{
    Club, GameError, GameState, Oracle, TurnOutcome, VerificationResult, SERVICE_BUSY_MESSAGE,
};

/// Everything a front end needs to draw the game after an operation.
#[derive(Clone, Debug)]
pub struct EngineSnapshot {
    pub state: GameState,
    pub last_error: Option<String>,
    pub busy: bool,
}

#[derive(Debug)]
struct Session {
    state: GameState,
    /// Bumped on every reset; answers for an older generation are dropped.
    generation: u64,
    /// Generation of the submission currently waiting on verification.
    pending: Option<u64>,
    last_error: Option<String>,
}

impl Session {
    fn record<T>(&mut self, result: &Result<T, GameError>) {
        self.last_error = result.as_ref().err().map(|e| e.to_string());
    }
}

/// Drives one game at a time against a shared cache and oracle.
pub struct GameEngine {
    session: Mutex<Session>,
    cache: Arc<dyn VerificationCache>,
    oracle: Arc<dyn Oracle>,
}

/// Releases the pending slot when a submission ends, including when its
/// future is dropped mid-verification.
struct PendingSlot<'a> {
    engine: &'a GameEngine,
    generation: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        let mut session = self.engine.session();
        if session.pending == Some(self.generation) {
            session.pending = None;
        }
    }
}

impl GameEngine {
    pub fn new(cache: Arc<dyn VerificationCache>, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            session: Mutex::new(Session {
                state: GameState::new(),
                generation: 0,
                pending: None,
                last_error: None,
            }),
            cache,
            oracle,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // no invariant spans a panic inside the lock, so a poisoned guard is still usable
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let session = self.session();
        EngineSnapshot {
            state: session.state.clone(),
            last_error: session.last_error.clone(),
            busy: session.pending.is_some(),
        }
    }

    pub fn state(&self) -> GameState {
        self.session().state.clone()
    }

    pub fn select_club(&self, club: Club) -> Result<(), GameError> {
        let mut session = self.session();
        let result = session.state.select_club(club);
        session.record(&result);
        result
    }

    pub fn reset(&self) {
        let mut session = self.session();
        session.state.reset();
        session.generation += 1;
        session.pending = None;
        session.last_error = None;
    }

    /// Verifies `name` for the current player and applies the answer.
    ///
    /// Only one submission may be outstanding; a second concurrent call gets
    /// [`GameError::SubmissionInFlight`]. If the game is reset while the
    /// oracle is thinking, the late answer is discarded with
    /// [`GameError::Superseded`].
    pub async fn submit_name(&self, name: &str) -> Result<TurnOutcome, GameError> {
        let (name, club_name, generation) = {
            let mut session = self.session();
            let checked = session.state.validate_submission(name).and_then(|name| {
                if session.pending.is_some() {
                    Err(GameError::SubmissionInFlight)
                } else {
                    Ok(name)
                }
            });
            let name = match checked {
                Ok(name) => name,
                Err(err) => {
                    session.last_error = Some(err.to_string());
                    return Err(err);
                }
            };
            let club_name = session
                .state
                .selected_club
                .as_ref()
                .map(|club| club.name.clone())
                .expect("Playing game always has a club");
            session.pending = Some(session.generation);
            session.last_error = None;
            (name, club_name, session.generation)
        };
        let _slot = PendingSlot {
            engine: self,
            generation,
        };

        let verification = self.resolve(&name, &club_name).await;
        self.apply(generation, &name, verification)
    }

    fn apply(
        &self,
        generation: u64,
        name: &str,
        verification: Result<VerificationResult, GameError>,
    ) -> Result<TurnOutcome, GameError> {
        let mut session = self.session();
        if session.generation != generation {
            log::info!("Discarding verification of {name}: game was reset");
            return Err(GameError::Superseded);
        }
        let result = verification.and_then(|v| session.state.apply_verification(name, &v));
        session.record(&result);
        result
    }

    /// Cache first, oracle on a miss. Cache trouble is logged and treated as
    /// a miss; it never fails the submission.
    async fn resolve(
        &self,
        name: &str,
        club_name: &str,
    ) -> Result<VerificationResult, GameError> {
        match self.cache.lookup(name, club_name).await {
            Ok(Some(cached)) => {
                log::debug!("Cache hit for {name} at {club_name}");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Cache lookup failed for {name} at {club_name}: {e}"),
        }

        log::info!("Verifying {name} at {club_name} with {}", self.oracle.name());
        let response = self.oracle.verify(name, club_name).await.map_err(|e| {
            log::warn!("{} could not verify {name}: {e}", self.oracle.name());
            GameError::TransientService(SERVICE_BUSY_MESSAGE.to_string())
        })?;

        let result = response.normalize(name, club_name);
        if response.is_conclusive() {
            if let Err(e) = self.cache.store(name, club_name, &result).await {
                log::warn!("Unable to cache verification of {name} at {club_name}: {e}");
            }
        } else {
            log::debug!("Not caching inconclusive answer for {name} at {club_name}");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::MemoryVerificationCache;
    use oracles::ScriptedOracle;
    use types::{GameStatus, Seat};

    fn engine_with(oracle: ScriptedOracle) -> (GameEngine, Arc<ScriptedOracle>) {
        let oracle = Arc::new(oracle);
        let engine = GameEngine::new(Arc::new(MemoryVerificationCache::new()), oracle.clone());
        (engine, oracle)
    }

    fn arsenal() -> Club {
        Club::new("arsenal", "Arsenal", "Premier League")
    }

    #[tokio::test]
    async fn test_snapshot_tracks_last_error() {
        let (engine, _) = engine_with(ScriptedOracle::new().with_valid("Tony Adams", "Arsenal", 669));
        engine.select_club(arsenal()).unwrap();

        let err = engine.submit_name("Lionel Messi").await.unwrap_err();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.last_error, Some(err.to_string()));
        assert!(!snapshot.busy);

        engine.submit_name("Tony Adams").await.unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.last_error, None);
        assert_eq!(snapshot.state.status, GameStatus::Finished);
        assert_eq!(snapshot.state.winner, Some(Seat::Two));
    }

    #[tokio::test]
    async fn test_inconclusive_answer_not_cached() {
        let (engine, oracle) = engine_with(ScriptedOracle::new().with_answer(
            "Ian Wright",
            "Arsenal",
            types::OracleResponse::default(),
        ));
        engine.select_club(arsenal()).unwrap();

        for _ in 0..2 {
            let err = engine.submit_name("Ian Wright").await.unwrap_err();
            assert_eq!(
                err,
                GameError::DomainInvalid("Could not verify Ian Wright played for Arsenal.".to_string())
            );
        }
        assert_eq!(oracle.calls(), 2);
    }
}
