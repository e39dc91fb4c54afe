//! MySQL native DSN: `[user[:password]@][net[(addr)]]/dbname[?param=value&...]`.

use percent_encoding::utf8_percent_encode;

use super::{percent_decode, COMPONENT};
use crate::error::DsnError;

pub const DEFAULT_PORT: u16 = 3306;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_SOCKET: &str = "/tmp/mysql.sock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MySqlAddress {
    Tcp { host: String, port: u16 },
    Unix { socket: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlDsn {
    pub user: String,
    pub password: Option<String>,
    pub address: MySqlAddress,
    /// Percent-decoded database segment; empty when the DSN names none.
    pub database: String,
    pub params: Vec<(String, String)>,
}

impl MySqlDsn {
    pub fn parse(dsn: &str) -> Result<Self, DsnError> {
        let slash = dsn.rfind('/').ok_or(DsnError::MissingDatabaseSeparator)?;
        let (head, tail) = (&dsn[..slash], &dsn[slash + 1..]);

        // The last '@' ends the credentials, so passwords may contain '@' and ':'.
        let (credentials, net_section) = match head.rfind('@') {
            Some(at) => (Some(&head[..at]), &head[at + 1..]),
            None => (None, head),
        };
        let (user, password) = match credentials {
            Some(creds) => match creds.split_once(':') {
                Some((user, password)) => (user.to_string(), Some(password.to_string())),
                None => (creds.to_string(), None),
            },
            None => (String::new(), None),
        };

        let address = parse_address(net_section)?;

        let (raw_database, raw_params) = match tail.split_once('?') {
            Some((database, params)) => (database, Some(params)),
            None => (tail, None),
        };
        let database = percent_decode(raw_database)?;
        let params = match raw_params {
            Some(raw) => parse_params(raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            user,
            password,
            address,
            database,
            params,
        })
    }

    /// Same server, credentials, and options with the database segment cleared.
    pub fn without_database(&self) -> Self {
        Self {
            database: String::new(),
            ..self.clone()
        }
    }

    /// `mysql://` URL understood by the sqlx driver behind sea-orm.
    pub fn connection_url(&self) -> String {
        let mut url = String::from("mysql://");
        if !self.user.is_empty() || self.password.is_some() {
            url.push_str(&encode(&self.user));
            if let Some(password) = &self.password {
                url.push(':');
                url.push_str(&encode(password));
            }
            url.push('@');
        }
        match &self.address {
            MySqlAddress::Tcp { host, port } => {
                url.push_str(&bracket_host(host));
                url.push(':');
                url.push_str(&port.to_string());
            }
            MySqlAddress::Unix { .. } => url.push_str("localhost"),
        }
        url.push('/');
        url.push_str(&encode(&self.database));

        let query: Vec<String> = self
            .driver_params()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", encode(&value)))
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Parameters the driver has no equivalent for; they are not forwarded.
    pub fn unsupported_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| !matches!(*key, "charset" | "collation" | "tls"))
            .collect()
    }

    /// Native-syntax rendering with the password masked, for logs and errors.
    pub fn redacted(&self) -> String {
        let mut out = String::new();
        if !self.user.is_empty() || self.password.is_some() {
            out.push_str(&self.user);
            if self.password.is_some() {
                out.push_str(":***");
            }
            out.push('@');
        }
        match &self.address {
            MySqlAddress::Tcp { host, port } => {
                out.push_str(&format!("tcp({}:{port})", bracket_host(host)));
            }
            MySqlAddress::Unix { socket } => out.push_str(&format!("unix({socket})")),
        }
        out.push('/');
        out.push_str(&self.database);
        out
    }

    fn driver_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let MySqlAddress::Unix { socket } = &self.address {
            params.push(("socket", socket.clone()));
        }
        for (key, value) in &self.params {
            match key.as_str() {
                "charset" => {
                    // The native syntax allows a fallback list; the driver takes one.
                    if let Some(first) = value.split(',').map(str::trim).find(|c| !c.is_empty()) {
                        params.push(("charset", first.to_string()));
                    }
                }
                "collation" => params.push(("collation", value.clone())),
                "tls" => params.push(("ssl-mode", ssl_mode(value).to_string())),
                _ => {}
            }
        }
        params
    }
}

fn ssl_mode(tls: &str) -> &'static str {
    match tls.to_ascii_lowercase().as_str() {
        "true" => "VERIFY_IDENTITY",
        "false" => "DISABLED",
        "preferred" => "PREFERRED",
        // skip-verify and named custom TLS configs both demand encryption.
        _ => "REQUIRED",
    }
}

fn parse_address(section: &str) -> Result<MySqlAddress, DsnError> {
    let (net, addr) = match section.find('(') {
        Some(open) => {
            let inner = &section[open + 1..];
            let Some(addr) = inner.strip_suffix(')') else {
                return Err(if inner.contains(')') {
                    DsnError::UnescapedAddress
                } else {
                    DsnError::UnterminatedAddress
                });
            };
            (&section[..open], addr)
        }
        None => (section, ""),
    };

    match net {
        "" | "tcp" | "tcp4" | "tcp6" => parse_tcp_address(addr),
        "unix" => Ok(MySqlAddress::Unix {
            socket: if addr.is_empty() {
                DEFAULT_SOCKET.to_string()
            } else {
                addr.to_string()
            },
        }),
        other => Err(DsnError::UnsupportedNetwork(other.to_string())),
    }
}

fn parse_tcp_address(addr: &str) -> Result<MySqlAddress, DsnError> {
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| DsnError::UnterminatedHost(addr.to_string()))?;
        match after {
            "" => (host, None),
            _ => match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => return Err(DsnError::InvalidPort(after.to_string())),
            },
        }
    } else if addr.matches(':').count() == 1 {
        let (host, port) = addr.split_once(':').unwrap_or((addr, ""));
        (host, Some(port))
    } else {
        // No colon, or an unbracketed IPv6 literal.
        (addr, None)
    };

    let port = match port {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| DsnError::InvalidPort(raw.to_string()))?,
        None => DEFAULT_PORT,
    };
    let host = if host.is_empty() { DEFAULT_HOST } else { host };

    Ok(MySqlAddress::Tcp {
        host: host.to_string(),
        port,
    })
}

fn parse_params(raw: &str) -> Result<Vec<(String, String)>, DsnError> {
    let mut params = Vec::new();
    for pair in raw.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        params.push((key.to_string(), percent_decode(value)?));
    }
    Ok(params)
}

fn bracket_host(host: &str) -> String {
    if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}
