use tracing::debug;

use crate::config::db::{BootstrapSettings, DbKind, SkipReason};
use crate::config::mysql_dsn::MySqlDsn;
use crate::error::BootstrapError;
use crate::infra::db::core::{create_if_missing, CreationOutcome};
use crate::infra::db::session::{
    close_admin_session, open_admin_session, AdminConnector, AdminTarget,
};

/// MySQL bootstrap: connect with the database segment cleared, then
/// create-if-missing. Deployments may omit the database segment on purpose,
/// in which case nothing is opened.
pub async fn ensure_mysql_database<C>(
    env_name: &str,
    dsn: &str,
    connector: &C,
    settings: &BootstrapSettings,
) -> Result<CreationOutcome, BootstrapError>
where
    C: AdminConnector,
{
    let parsed = MySqlDsn::parse(dsn).map_err(|source| BootstrapError::Parse {
        env_name: env_name.to_string(),
        source,
    })?;

    let database = parsed.database.trim().to_string();
    if database.is_empty() {
        debug!(env = env_name, "DSN names no database, skipping bootstrap");
        return Ok(CreationOutcome::Skipped(SkipReason::NoDatabaseName));
    }

    let ignored = parsed.unsupported_params();
    if !ignored.is_empty() {
        debug!(
            env = env_name,
            params = ?ignored,
            "DSN parameters not used for the admin connection"
        );
    }

    let target = AdminTarget::MySql(parsed.without_database());
    let mut session = open_admin_session(connector, &target, settings.probe_timeout)
        .await
        .map_err(|source| BootstrapError::Connect {
            env_name: env_name.to_string(),
            target: target.redacted(),
            source,
        })?;

    let result = create_if_missing(&mut session, DbKind::MySql, env_name, &database).await;
    close_admin_session(session, env_name).await;
    result
}
