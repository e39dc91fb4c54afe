use sea_orm::DbErr;
use thiserror::Error;

/// Coarse classification of a bootstrap failure, for callers that branch on
/// the failure class instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Connect,
    Query,
    Create,
}

/// Malformed connection string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DsnError {
    #[error("invalid DSN: missing the slash separating the database name")]
    MissingDatabaseSeparator,
    #[error("invalid DSN: network address not terminated (missing closing parenthesis)")]
    UnterminatedAddress,
    #[error("invalid DSN: did you forget to escape a param value?")]
    UnescapedAddress,
    #[error("invalid DSN: unsupported network protocol `{0}`")]
    UnsupportedNetwork(String),
    #[error("invalid DSN: bracketed host `{0}` is missing its closing `]`")]
    UnterminatedHost(String),
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    #[error("invalid percent-encoding in `{0}`")]
    InvalidEscape(String),
    #[error("connection string contains a control character")]
    ControlCharacter,
    #[error("unsupported URI scheme (expected postgres:// or postgresql://)")]
    UnsupportedScheme,
}

/// Startup-fatal bootstrap failure. Every variant names the environment
/// variable the connection string was read from.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to parse {env_name}: {source}")]
    Parse {
        env_name: String,
        #[source]
        source: DsnError,
    },
    #[error("{env_name}: failed to open admin connection to {target}: {source}")]
    Connect {
        env_name: String,
        target: String,
        #[source]
        source: DbErr,
    },
    #[error("{env_name}: no admin connection available")]
    NoAdminConnection { env_name: String },
    #[error("{env_name}: failed to check whether database `{database}` exists: {source}")]
    Query {
        env_name: String,
        database: String,
        #[source]
        source: DbErr,
    },
    #[error("{env_name}: failed to create database `{database}`: {source}")]
    Create {
        env_name: String,
        database: String,
        #[source]
        source: DbErr,
    },
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::Parse { .. } => ErrorKind::Parse,
            BootstrapError::Connect { .. } | BootstrapError::NoAdminConnection { .. } => {
                ErrorKind::Connect
            }
            BootstrapError::Query { .. } => ErrorKind::Query,
            BootstrapError::Create { .. } => ErrorKind::Create,
        }
    }

    /// Name of the environment variable whose connection string failed.
    pub fn env_name(&self) -> &str {
        match self {
            BootstrapError::Parse { env_name, .. }
            | BootstrapError::Connect { env_name, .. }
            | BootstrapError::NoAdminConnection { env_name }
            | BootstrapError::Query { env_name, .. }
            | BootstrapError::Create { env_name, .. } => env_name,
        }
    }
}
