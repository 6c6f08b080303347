pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryVerificationCache;
pub use sqlite::SqliteVerificationCache;
pub use traits::VerificationCache;
