//! In-memory stand-in for a MySQL or PostgreSQL server.
//!
//! Clones share one server, so several concurrent bootstrap calls can race
//! against the same catalog. CREATE statements are parsed back into a single
//! quoted identifier; anything after the closing delimiter is rejected as a
//! syntax error, which is how injection attempts show up in tests.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use db_bootstrap::{AdminConnector, AdminSession, AdminTarget, DbKind};
use parking_lot::Mutex;
use sea_orm::DbErr;
use tokio::sync::Barrier;

#[derive(Default)]
struct ServerState {
    databases: BTreeSet<String>,
    refused: HashSet<String>,
    failing_pings: HashSet<String>,
    stalled_pings: HashSet<String>,
    stalled_connects: HashSet<String>,
    /// Checks answered normally before every later one fails with the message.
    existence_failure: Option<(usize, String)>,
    create_failure: Option<String>,
    connect_attempts: Vec<String>,
    connection_urls: Vec<String>,
    statements: Vec<String>,
    existence_checks: usize,
    created: usize,
    open_sessions: usize,
    closed_sessions: usize,
}

struct ExistenceGate {
    barrier: Arc<Barrier>,
    remaining: usize,
}

#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
    gate: Arc<Mutex<Option<ExistenceGate>>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(self, name: &str) -> Self {
        self.state.lock().databases.insert(name.to_string());
        self
    }

    /// Connections selecting `database` are refused. Use `""` for a MySQL
    /// admin connection, which selects no database.
    pub fn refuse(self, database: &str) -> Self {
        self.state.lock().refused.insert(database.to_string());
        self
    }

    /// Connections selecting `database` open but fail their liveness probe.
    pub fn fail_ping(self, database: &str) -> Self {
        self.state.lock().failing_pings.insert(database.to_string());
        self
    }

    /// Liveness probes on `database` never answer.
    pub fn stall_ping(self, database: &str) -> Self {
        self.state.lock().stalled_pings.insert(database.to_string());
        self
    }

    /// Connection attempts selecting `database` never complete.
    pub fn stall_connect(self, database: &str) -> Self {
        self.state.lock().stalled_connects.insert(database.to_string());
        self
    }

    pub fn fail_existence_checks(self, message: &str) -> Self {
        self.fail_existence_checks_after(0, message)
    }

    /// The first `healthy` existence checks answer normally; every later one
    /// fails with `message`.
    pub fn fail_existence_checks_after(self, healthy: usize, message: &str) -> Self {
        self.state.lock().existence_failure = Some((healthy, message.to_string()));
        self
    }

    /// Every CREATE fails with `message` without creating anything.
    pub fn deny_create(self, message: &str) -> Self {
        self.state.lock().create_failure = Some(message.to_string());
        self
    }

    /// The next `callers` existence checks all read the catalog and then wait
    /// for each other before answering, so every one of them sees the state
    /// from before any of them could CREATE.
    pub fn hold_existence_checks(self, callers: usize) -> Self {
        *self.gate.lock() = Some(ExistenceGate {
            barrier: Arc::new(Barrier::new(callers)),
            remaining: callers,
        });
        self
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.lock().databases.contains(name)
    }

    pub fn databases(&self) -> Vec<String> {
        self.state.lock().databases.iter().cloned().collect()
    }

    /// Database selected by each connection attempt, in order.
    pub fn connect_attempts(&self) -> Vec<String> {
        self.state.lock().connect_attempts.clone()
    }

    pub fn connection_urls(&self) -> Vec<String> {
        self.state.lock().connection_urls.clone()
    }

    /// DDL statements received, including rejected ones.
    pub fn executed_statements(&self) -> Vec<String> {
        self.state.lock().statements.clone()
    }

    pub fn existence_checks(&self) -> usize {
        self.state.lock().existence_checks
    }

    /// Number of CREATE statements that actually created a database.
    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().open_sessions
    }

    pub fn closed_sessions(&self) -> usize {
        self.state.lock().closed_sessions
    }

    fn take_gate(&self) -> Option<Arc<Barrier>> {
        let mut gate = self.gate.lock();
        let held = gate.as_mut()?;
        if held.remaining == 0 {
            return None;
        }
        held.remaining -= 1;
        Some(held.barrier.clone())
    }

    fn create(&self, kind: DbKind, sql: &str) -> Result<(), DbErr> {
        let mut state = self.state.lock();
        state.statements.push(sql.to_string());

        let name = parse_create_database(kind, sql)?;
        if let Some(message) = &state.create_failure {
            return Err(DbErr::Custom(message.clone()));
        }
        if state.databases.contains(&name) {
            return Err(DbErr::Custom(match kind {
                DbKind::MySql => {
                    format!("1007 (HY000): Can't create database '{name}'; database exists")
                }
                DbKind::Postgres => format!("42P04: database \"{name}\" already exists"),
            }));
        }
        state.databases.insert(name);
        state.created += 1;
        Ok(())
    }
}

pub struct FakeSession {
    server: FakeServer,
    kind: DbKind,
    database: String,
}

#[async_trait]
impl AdminConnector for FakeServer {
    type Session = FakeSession;

    async fn connect(
        &self,
        target: &AdminTarget,
        _timeout: Duration,
    ) -> Result<FakeSession, DbErr> {
        let database = target.database().to_string();
        let stalls = {
            let mut state = self.state.lock();
            state.connect_attempts.push(database.clone());
            state.connection_urls.push(target.connection_url());
            state.stalled_connects.contains(&database)
        };
        if stalls {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock();
        if state.refused.contains(&database) {
            return Err(DbErr::Custom(format!(
                "connection refused for database \"{database}\""
            )));
        }
        state.open_sessions += 1;
        Ok(FakeSession {
            server: self.clone(),
            kind: target.kind(),
            database,
        })
    }
}

#[async_trait]
impl AdminSession for FakeSession {
    async fn ping(&mut self) -> Result<(), DbErr> {
        let (fails, stalls) = {
            let state = self.server.state.lock();
            (
                state.failing_pings.contains(&self.database),
                state.stalled_pings.contains(&self.database),
            )
        };
        if stalls {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(DbErr::Custom(format!(
                "database \"{}\" is not accepting connections",
                self.database
            )));
        }
        Ok(())
    }

    async fn database_exists(&mut self, name: &str) -> Result<bool, DbErr> {
        let exists = {
            let mut state = self.server.state.lock();
            state.existence_checks += 1;
            if let Some((healthy, message)) = &state.existence_failure {
                if state.existence_checks > *healthy {
                    return Err(DbErr::Custom(message.clone()));
                }
            }
            state.databases.contains(name)
        };
        if let Some(barrier) = self.server.take_gate() {
            barrier.wait().await;
        }
        Ok(exists)
    }

    async fn execute_ddl(&mut self, sql: &str) -> Result<(), DbErr> {
        self.server.create(self.kind, sql)
    }

    async fn close(self) -> Result<(), DbErr> {
        let mut state = self.server.state.lock();
        state.open_sessions -= 1;
        state.closed_sessions += 1;
        Ok(())
    }
}

/// Parse `CREATE DATABASE <quoted identifier>` the way the target engine would.
fn parse_create_database(kind: DbKind, sql: &str) -> Result<String, DbErr> {
    let syntax_error = || DbErr::Custom(format!("syntax error near: {sql}"));
    let quoted = sql.strip_prefix("CREATE DATABASE ").ok_or_else(syntax_error)?;
    let delimiter = match kind {
        DbKind::MySql => '`',
        DbKind::Postgres => '"',
    };

    let mut chars = quoted.chars();
    if chars.next() != Some(delimiter) {
        return Err(syntax_error());
    }
    let mut name = String::new();
    loop {
        match chars.next() {
            Some(c) if c == delimiter => {
                let rest = chars.as_str();
                if rest.starts_with(delimiter) {
                    name.push(delimiter);
                    chars.next();
                } else if rest.is_empty() {
                    return Ok(name);
                } else {
                    return Err(syntax_error());
                }
            }
            Some(c) => name.push(c),
            None => return Err(syntax_error()),
        }
    }
}
