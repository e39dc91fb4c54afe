use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};

use crate::config::db::DbKind;

const MYSQL_EXISTS_SQL: &str =
    "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?";
const POSTGRES_EXISTS_SQL: &str =
    "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS present";

/// Catalog lookup for `name`, bound as a parameter.
pub fn existence_statement(kind: DbKind, name: &str) -> Statement {
    match kind {
        DbKind::MySql => Statement::from_sql_and_values(
            DatabaseBackend::MySql,
            MYSQL_EXISTS_SQL,
            vec![name.into()],
        ),
        DbKind::Postgres => Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            POSTGRES_EXISTS_SQL,
            vec![name.into()],
        ),
    }
}

/// `Ok(false)` only when the catalog has no matching entry; every other
/// failure is returned as-is.
pub async fn database_exists<C>(conn: &C, kind: DbKind, name: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let row = conn.query_one(existence_statement(kind, name)).await?;
    match kind {
        DbKind::MySql => Ok(row.is_some()),
        DbKind::Postgres => match row {
            Some(row) => row.try_get::<bool>("", "present"),
            None => Err(DbErr::RecordNotFound(
                "pg_database existence probe returned no row".to_string(),
            )),
        },
    }
}
