//! PostgreSQL URI DSN (`postgres://` / `postgresql://`).
//!
//! Only the path is ever rewritten, so credentials, hosts, and query options such
//! as `sslmode` reach the maintenance connection byte-for-byte.

use percent_encoding::utf8_percent_encode;

use super::{percent_decode, COMPONENT};
use crate::error::DsnError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresDsn {
    scheme: String,
    authority: String,
    path: String,
    suffix: String,
    /// Percent-decoded path with leading separators and whitespace trimmed.
    pub database: String,
}

impl PostgresDsn {
    pub fn parse(dsn: &str) -> Result<Self, DsnError> {
        if dsn.chars().any(char::is_control) {
            return Err(DsnError::ControlCharacter);
        }
        let (scheme, rest) = dsn.split_once("://").ok_or(DsnError::UnsupportedScheme)?;
        if !matches!(scheme, "postgres" | "postgresql") {
            return Err(DsnError::UnsupportedScheme);
        }

        let authority_end = rest
            .find(|c: char| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        validate_authority(authority)?;

        let remainder = &rest[authority_end..];
        let path_end = remainder
            .find(|c: char| matches!(c, '?' | '#'))
            .unwrap_or(remainder.len());
        let (path, suffix) = remainder.split_at(path_end);

        let database = percent_decode(path)?
            .trim_start_matches('/')
            .trim()
            .to_string();

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            path: path.to_string(),
            suffix: suffix.to_string(),
            database,
        })
    }

    /// Same server and options, pointed at `database` instead.
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            path: format!("/{}", utf8_percent_encode(database, COMPONENT)),
            database: database.to_string(),
            ..self.clone()
        }
    }

    pub fn connection_url(&self) -> String {
        format!(
            "{}://{}{}{}",
            self.scheme, self.authority, self.path, self.suffix
        )
    }

    /// URI without query options and with the password masked.
    pub fn redacted(&self) -> String {
        let authority = match self.authority.rsplit_once('@') {
            Some((userinfo, host)) => match userinfo.split_once(':') {
                Some((user, _)) => format!("{user}:***@{host}"),
                None => self.authority.clone(),
            },
            None => self.authority.clone(),
        };
        format!("{}://{}{}", self.scheme, authority, self.path)
    }
}

fn validate_authority(authority: &str) -> Result<(), DsnError> {
    let (userinfo, host_port) = match authority.rsplit_once('@') {
        Some((userinfo, host_port)) => (Some(userinfo), host_port),
        None => (None, authority),
    };
    if let Some(userinfo) = userinfo {
        percent_decode(userinfo)?;
    }

    let port = if let Some(rest) = host_port.strip_prefix('[') {
        match rest.split_once(']') {
            Some((_, "")) => None,
            Some((_, after)) => Some(
                after
                    .strip_prefix(':')
                    .ok_or_else(|| DsnError::InvalidPort(after.to_string()))?,
            ),
            None => return Err(DsnError::UnterminatedHost(host_port.to_string())),
        }
    } else {
        host_port.rsplit_once(':').map(|(_, port)| port)
    };

    match port {
        Some(port) if !port.bytes().all(|b| b.is_ascii_digit()) => {
            Err(DsnError::InvalidPort(port.to_string()))
        }
        _ => Ok(()),
    }
}
