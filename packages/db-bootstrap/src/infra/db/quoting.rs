//! Identifier quoting. This is the only path by which a database name reaches
//! raw SQL text; existence checks bind the name as a parameter instead.

use crate::config::db::DbKind;

/// Backtick-delimited MySQL identifier, embedded backticks doubled.
pub fn quote_mysql_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Double-quote-delimited PostgreSQL identifier, embedded quotes doubled.
pub fn quote_postgres_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_identifier(kind: DbKind, name: &str) -> String {
    match kind {
        DbKind::MySql => quote_mysql_identifier(name),
        DbKind::Postgres => quote_postgres_identifier(name),
    }
}

pub fn create_database_statement(kind: DbKind, name: &str) -> String {
    format!("CREATE DATABASE {}", quote_identifier(kind, name))
}
