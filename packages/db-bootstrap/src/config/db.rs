use std::env;
use std::time::Duration;

/// Prefix marking the embedded, file-based database. There is no server to
/// create anything on, so these DSNs never reach a bootstrapper.
pub const LOCAL_MARKER: &str = "local";

const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

pub const PROBE_TIMEOUT_ENV: &str = "DB_BOOTSTRAP_PROBE_TIMEOUT_MS";
pub const MAINTENANCE_DBS_ENV: &str = "DB_BOOTSTRAP_PG_MAINTENANCE_DBS";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];

/// Server engine family a DSN targets. Decided once by [`classify`] and never
/// re-derived from the string afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// Native `user:pass@tcp(host:port)/dbname?params` syntax.
    MySql,
    /// `postgres://` or `postgresql://` URI.
    Postgres,
}

impl DbKind {
    pub fn engine(self) -> &'static str {
        match self {
            DbKind::MySql => "mysql",
            DbKind::Postgres => "postgresql",
        }
    }
}

/// Why a bootstrap call returned without touching a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyDsn,
    LocalDatabase,
    NoDatabaseName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsnClass<'a> {
    Skip(SkipReason),
    Server { kind: DbKind, dsn: &'a str },
}

/// Decide whether `dsn` needs a bootstrap and which engine handles it.
/// Never parses beyond the prefix and never opens a connection.
pub fn classify(dsn: &str) -> DsnClass<'_> {
    if dsn.is_empty() {
        return DsnClass::Skip(SkipReason::EmptyDsn);
    }
    if dsn.starts_with(LOCAL_MARKER) {
        return DsnClass::Skip(SkipReason::LocalDatabase);
    }
    let kind = if POSTGRES_SCHEMES.iter().any(|scheme| dsn.starts_with(scheme)) {
        DbKind::Postgres
    } else {
        DbKind::MySql
    };
    DsnClass::Server { kind, dsn }
}

/// Tunables for one bootstrap call. Passed explicitly; nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    /// Upper bound on opening an admin session plus its liveness probe.
    pub probe_timeout: Duration,
    /// PostgreSQL maintenance databases tried in order for the admin session.
    pub maintenance_databases: Vec<String>,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            maintenance_databases: DEFAULT_MAINTENANCE_DATABASES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl BootstrapSettings {
    /// Defaults overridden by `DB_BOOTSTRAP_PROBE_TIMEOUT_MS` and
    /// `DB_BOOTSTRAP_PG_MAINTENANCE_DBS`. An unparseable timeout keeps the default.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(ms) = env::var(PROBE_TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            settings.probe_timeout = Duration::from_millis(ms);
        }

        if let Ok(raw) = env::var(MAINTENANCE_DBS_ENV) {
            settings.maintenance_databases = parse_candidate_list(&raw);
        }

        settings
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn with_maintenance_databases<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.maintenance_databases = names.into_iter().map(Into::into).collect();
        self
    }
}

fn parse_candidate_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
