//! Startup-time database existence bootstrap.
//! Makes sure the database named by a MySQL or PostgreSQL DSN exists before the
//! application opens its main pool, creating it when missing.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db::{classify, BootstrapSettings, DbKind, DsnClass, SkipReason};
pub use config::mysql_dsn::MySqlDsn;
pub use config::postgres_dsn::PostgresDsn;
pub use error::{BootstrapError, DsnError, ErrorKind};
pub use infra::db::{
    ensure_database_exists, ensure_database_exists_from_env, AdminConnector, AdminSession,
    AdminTarget, CreationOutcome, SeaOrmConnector,
};
