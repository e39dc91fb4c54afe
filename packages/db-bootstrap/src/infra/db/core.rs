use std::env::{self, VarError};

use tracing::{debug, info, warn};

use crate::config::db::{classify, BootstrapSettings, DbKind, DsnClass, SkipReason};
use crate::error::BootstrapError;
use crate::infra::db::mysql::ensure_mysql_database;
use crate::infra::db::postgres::ensure_postgres_database;
use crate::infra::db::quoting::create_database_statement;
use crate::infra::db::session::{AdminConnector, AdminSession, SeaOrmConnector};

/// What a successful bootstrap call did. Failures are the `Err` arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOutcome {
    Skipped(SkipReason),
    AlreadyExisted,
    Created,
    /// Our CREATE failed but the database exists: another process created it.
    CreatedByRaceWinner,
}

/// Read the DSN from `env_name` and make sure its database exists.
///
/// An unset variable is treated like an empty one. Must be awaited before the
/// application opens its main pool against the same DSN.
pub async fn ensure_database_exists_from_env(
    env_name: &str,
    settings: &BootstrapSettings,
) -> Result<CreationOutcome, BootstrapError> {
    let dsn = match env::var(env_name) {
        Ok(dsn) => dsn,
        Err(VarError::NotPresent) => String::new(),
        Err(VarError::NotUnicode(raw)) => raw.to_string_lossy().into_owned(),
    };
    ensure_database_exists(env_name, &dsn, &SeaOrmConnector, settings).await
}

/// Classify `dsn` and run the matching engine bootstrapper.
/// `env_name` is only used to label logs and errors.
pub async fn ensure_database_exists<C>(
    env_name: &str,
    dsn: &str,
    connector: &C,
    settings: &BootstrapSettings,
) -> Result<CreationOutcome, BootstrapError>
where
    C: AdminConnector,
{
    match classify(dsn) {
        DsnClass::Skip(reason) => {
            debug!(env = env_name, reason = ?reason, "database bootstrap skipped");
            Ok(CreationOutcome::Skipped(reason))
        }
        DsnClass::Server {
            kind: DbKind::MySql,
            dsn,
        } => ensure_mysql_database(env_name, dsn, connector, settings).await,
        DsnClass::Server {
            kind: DbKind::Postgres,
            dsn,
        } => ensure_postgres_database(env_name, dsn, connector, settings).await,
    }
}

/// Existence check, optimistic CREATE, and a single recheck when the CREATE
/// fails. A failed CREATE followed by a positive recheck means another
/// process won the race; nothing is retried beyond that.
pub(crate) async fn create_if_missing<S>(
    session: &mut S,
    kind: DbKind,
    env_name: &str,
    database: &str,
) -> Result<CreationOutcome, BootstrapError>
where
    S: AdminSession,
{
    let exists = session
        .database_exists(database)
        .await
        .map_err(|source| BootstrapError::Query {
            env_name: env_name.to_string(),
            database: database.to_string(),
            source,
        })?;
    if exists {
        debug!(env = env_name, database, engine = kind.engine(), "database already exists");
        return Ok(CreationOutcome::AlreadyExisted);
    }

    info!(env = env_name, database, engine = kind.engine(), "database missing, creating");
    let statement = create_database_statement(kind, database);
    let create_err = match session.execute_ddl(&statement).await {
        Ok(()) => {
            info!(env = env_name, database, engine = kind.engine(), "database created");
            return Ok(CreationOutcome::Created);
        }
        Err(e) => e,
    };

    match session.database_exists(database).await {
        Ok(true) => {
            info!(
                env = env_name,
                database,
                engine = kind.engine(),
                error = %create_err,
                "database created concurrently by another process"
            );
            Ok(CreationOutcome::CreatedByRaceWinner)
        }
        Ok(false) => Err(create_error(env_name, database, create_err)),
        Err(recheck_err) => {
            warn!(
                env = env_name,
                database,
                error = %recheck_err,
                "existence recheck after failed create also failed"
            );
            Err(create_error(env_name, database, create_err))
        }
    }
}

fn create_error(env_name: &str, database: &str, source: sea_orm::DbErr) -> BootstrapError {
    BootstrapError::Create {
        env_name: env_name.to_string(),
        database: database.to_string(),
        source,
    }
}
