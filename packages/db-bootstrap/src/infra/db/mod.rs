//! Admin connections, existence checks, and per-engine create-if-missing flows.

pub mod core;
pub mod existence;
pub mod mysql;
pub mod postgres;
pub mod quoting;
pub mod session;

pub use core::{ensure_database_exists, ensure_database_exists_from_env, CreationOutcome};
pub use session::{AdminConnector, AdminSession, AdminTarget, SeaOrmConnector, SeaOrmSession};
