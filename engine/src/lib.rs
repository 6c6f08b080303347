pub mod game_engine;
pub mod settings;

pub use game_engine::{EngineSnapshot, GameEngine};
pub use settings::{OracleKind, Settings, SettingsError};
