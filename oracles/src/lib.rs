pub mod gemini;
pub mod referee;
pub mod scripted;

pub use crate::gemini::{GeminiConfig, GeminiOracle};
pub use crate::referee::RefereeOracle;
pub use crate::scripted::{FixtureError, ScriptedOracle};
