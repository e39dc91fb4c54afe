use sea_orm::DbErr;
use tracing::{debug, warn};

use crate::config::db::{BootstrapSettings, DbKind, SkipReason};
use crate::config::postgres_dsn::PostgresDsn;
use crate::error::BootstrapError;
use crate::infra::db::core::{create_if_missing, CreationOutcome};
use crate::infra::db::session::{
    close_admin_session, open_admin_session, AdminConnector, AdminTarget,
};

/// PostgreSQL bootstrap: resolve an admin session through the maintenance
/// databases, then create-if-missing.
pub async fn ensure_postgres_database<C>(
    env_name: &str,
    dsn: &str,
    connector: &C,
    settings: &BootstrapSettings,
) -> Result<CreationOutcome, BootstrapError>
where
    C: AdminConnector,
{
    let parsed = PostgresDsn::parse(dsn).map_err(|source| BootstrapError::Parse {
        env_name: env_name.to_string(),
        source,
    })?;

    if parsed.database.is_empty() {
        debug!(env = env_name, "DSN names no database, skipping bootstrap");
        return Ok(CreationOutcome::Skipped(SkipReason::NoDatabaseName));
    }

    let mut session = resolve_admin_session(connector, &parsed, settings, env_name).await?;
    let result =
        create_if_missing(&mut session, DbKind::Postgres, env_name, &parsed.database).await;
    close_admin_session(session, env_name).await;
    result
}

/// Try each maintenance database in order and return the first session that
/// answers its liveness probe. When all are refused only the last failure is
/// reported.
pub async fn resolve_admin_session<C>(
    connector: &C,
    dsn: &PostgresDsn,
    settings: &BootstrapSettings,
    env_name: &str,
) -> Result<C::Session, BootstrapError>
where
    C: AdminConnector,
{
    let mut last_failure: Option<(String, DbErr)> = None;

    for candidate in &settings.maintenance_databases {
        let target = AdminTarget::Postgres(dsn.with_database(candidate));
        match open_admin_session(connector, &target, settings.probe_timeout).await {
            Ok(session) => {
                debug!(env = env_name, maintenance_db = %candidate, "admin connection established");
                return Ok(session);
            }
            Err(e) => {
                warn!(
                    env = env_name,
                    maintenance_db = %candidate,
                    error = %e,
                    "maintenance database refused admin connection"
                );
                last_failure = Some((target.redacted(), e));
            }
        }
    }

    Err(match last_failure {
        Some((target, source)) => BootstrapError::Connect {
            env_name: env_name.to_string(),
            target,
            source,
        },
        None => BootstrapError::NoAdminConnection {
            env_name: env_name.to_string(),
        },
    })
}
