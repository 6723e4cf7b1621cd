// Storage layer for SpiceScape
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// Each call on StorageBackend is a single-row write or a read. Keeping the
// cross-collection lists consistent is the job of services::graph.

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
