use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::db::DbKind;
use crate::config::mysql_dsn::MySqlDsn;
use crate::config::postgres_dsn::PostgresDsn;
use crate::infra::db::existence;

/// Server-level connection that does not select the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminTarget {
    /// MySQL DSN with its database segment cleared.
    MySql(MySqlDsn),
    /// PostgreSQL DSN pointed at one maintenance database.
    Postgres(PostgresDsn),
}

impl AdminTarget {
    pub fn kind(&self) -> DbKind {
        match self {
            AdminTarget::MySql(_) => DbKind::MySql,
            AdminTarget::Postgres(_) => DbKind::Postgres,
        }
    }

    /// Database the admin connection selects; empty for MySQL.
    pub fn database(&self) -> &str {
        match self {
            AdminTarget::MySql(dsn) => &dsn.database,
            AdminTarget::Postgres(dsn) => &dsn.database,
        }
    }

    pub fn connection_url(&self) -> String {
        match self {
            AdminTarget::MySql(dsn) => dsn.connection_url(),
            AdminTarget::Postgres(dsn) => dsn.connection_url(),
        }
    }

    pub fn redacted(&self) -> String {
        match self {
            AdminTarget::MySql(dsn) => dsn.redacted(),
            AdminTarget::Postgres(dsn) => dsn.redacted(),
        }
    }
}

/// An open administrative connection, owned by exactly one bootstrap call.
#[async_trait]
pub trait AdminSession: Send + Sized {
    /// Explicit round-trip liveness probe.
    async fn ping(&mut self) -> Result<(), DbErr>;

    async fn database_exists(&mut self, name: &str) -> Result<bool, DbErr>;

    /// Run one already-quoted DDL statement.
    async fn execute_ddl(&mut self, sql: &str) -> Result<(), DbErr>;

    async fn close(self) -> Result<(), DbErr>;
}

/// Opens admin sessions. The production implementation is [`SeaOrmConnector`].
#[async_trait]
pub trait AdminConnector: Send + Sync {
    type Session: AdminSession;

    async fn connect(
        &self,
        target: &AdminTarget,
        connect_timeout: Duration,
    ) -> Result<Self::Session, DbErr>;
}

/// Opens a single-connection sea-orm pool per admin target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmConnector;

pub struct SeaOrmSession {
    conn: DatabaseConnection,
    kind: DbKind,
}

#[async_trait]
impl AdminConnector for SeaOrmConnector {
    type Session = SeaOrmSession;

    async fn connect(
        &self,
        target: &AdminTarget,
        connect_timeout: Duration,
    ) -> Result<SeaOrmSession, DbErr> {
        let mut opt = ConnectOptions::new(target.connection_url());
        opt.min_connections(1)
            .max_connections(1)
            .connect_timeout(connect_timeout)
            .acquire_timeout(connect_timeout)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Ok(SeaOrmSession {
            conn,
            kind: target.kind(),
        })
    }
}

#[async_trait]
impl AdminSession for SeaOrmSession {
    async fn ping(&mut self) -> Result<(), DbErr> {
        self.conn.ping().await
    }

    async fn database_exists(&mut self, name: &str) -> Result<bool, DbErr> {
        existence::database_exists(&self.conn, self.kind, name).await
    }

    async fn execute_ddl(&mut self, sql: &str) -> Result<(), DbErr> {
        self.conn.execute_unprepared(sql).await.map(|_| ())
    }

    async fn close(self) -> Result<(), DbErr> {
        self.conn.close().await
    }
}

/// Connect, then probe liveness; each step is bounded by `probe_timeout`. A
/// session that fails or outlasts its probe is closed before the error is
/// returned.
pub async fn open_admin_session<C>(
    connector: &C,
    target: &AdminTarget,
    probe_timeout: Duration,
) -> Result<C::Session, DbErr>
where
    C: AdminConnector,
{
    let mut session = timeout(probe_timeout, connector.connect(target, probe_timeout))
        .await
        .map_err(|_| not_ready(probe_timeout))??;

    let probe = match timeout(probe_timeout, session.ping()).await {
        Ok(result) => result,
        Err(_) => Err(not_ready(probe_timeout)),
    };
    match probe {
        Ok(()) => Ok(session),
        Err(e) => {
            if let Err(close_err) = session.close().await {
                debug!(error = %close_err, "closing rejected admin connection failed");
            }
            Err(e)
        }
    }
}

fn not_ready(probe_timeout: Duration) -> DbErr {
    DbErr::Custom(format!(
        "admin connection not ready within {}ms",
        probe_timeout.as_millis()
    ))
}

/// Release the session. A close failure is logged and otherwise ignored so it
/// never replaces the bootstrap result.
pub async fn close_admin_session<S>(session: S, env_name: &str)
where
    S: AdminSession,
{
    if let Err(e) = session.close().await {
        warn!(env = env_name, error = %e, "failed to close admin connection");
    }
}
