//! Connection configuration
//!
//! Connection descriptors are URI-like strings whose scheme selects the
//! backend:
//!
//! | Descriptor | Backend | Driver target |
//! |------------|---------|---------------|
//! | `sqlite:///app.db` | SQLite | `app.db` |
//! | `sqlite:///:memory:` or `sqlite://` | SQLite | `:memory:` |
//! | `postgres://…`, `postgresql://…` | PostgreSQL | the full descriptor |
//!
//! Reserved characters inside a component are percent-encoded, as
//! [`ConnectionBuilder`] does; the SQLite path is decoded again on parse.

use super::database_types::DatabaseType;
use super::error::Result;
use std::time::Duration;

/// Default driver timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options handed to [`Backend::connect`](super::Backend::connect)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Driver timeout: the busy timeout for SQLite, the connect timeout for PostgreSQL
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConnectOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the driver timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A parsed connection descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    database_type: DatabaseType,
    target: String,
}

impl ConnectionDescriptor {
    /// Parse a descriptor, resolving the backend from its scheme
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the scheme when no backend handles it.
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri.split_once(':').unwrap_or(("", uri));
        let database_type: DatabaseType = scheme.parse()?;

        let target = match database_type {
            DatabaseType::Sqlite => sqlite_path(rest),
            DatabaseType::Postgres => uri.to_string(),
        };

        Ok(Self {
            database_type,
            target,
        })
    }

    /// Backend selected by the scheme
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    /// What the driver connects to: a file path for SQLite, the full URI for PostgreSQL
    pub fn target(&self) -> &str {
        &self.target
    }
}

// Everything after "sqlite:": drop the authority, query and fragment, then the
// leading path separator.
fn sqlite_path(rest: &str) -> String {
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => authority_and_path
            .find('/')
            .map(|i| &authority_and_path[i..])
            .unwrap_or_default(),
        None => rest,
    };
    let path = path.strip_prefix('/').unwrap_or(path);

    if path.is_empty() {
        ":memory:".to_string()
    } else {
        percent_decode(path)
    }
}

// Bytes kept as-is besides ASCII alphanumerics
const UNRESERVED: &[u8] = b"-._~";
const PATH_SAFE: &[u8] = b"-._~/:";

fn percent_encode(input: &str, keep: &[u8]) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || keep.contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

// Malformed escapes are kept literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                decoded.push(byte);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Builds connection descriptors from their parts
pub struct ConnectionBuilder {
    db_type: DatabaseType,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    options: Vec<(String, String)>,
}

impl ConnectionBuilder {
    /// Create a new connection builder for the specified database type
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            host: None,
            port: None,
            database: None,
            username: None,
            password: None,
            options: Vec::new(),
        }
    }

    /// Set the database host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name (the file path for SQLite)
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the username
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a custom option, appended as a query parameter
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Build the connection descriptor, percent-encoding every component
    pub fn build_connection_string(&self) -> String {
        match self.db_type {
            DatabaseType::Sqlite => format!(
                "sqlite:///{}",
                percent_encode(self.database.as_deref().unwrap_or(":memory:"), PATH_SAFE)
            ),
            DatabaseType::Postgres => {
                let mut uri = String::from("postgresql://");
                if let Some(username) = &self.username {
                    uri.push_str(&percent_encode(username, UNRESERVED));
                    if let Some(password) = &self.password {
                        uri.push(':');
                        uri.push_str(&percent_encode(password, UNRESERVED));
                    }
                    uri.push('@');
                }
                uri.push_str(self.host.as_deref().unwrap_or("localhost"));
                if let Some(port) = self.port {
                    uri.push_str(&format!(":{}", port));
                }
                if let Some(database) = &self.database {
                    uri.push('/');
                    uri.push_str(&percent_encode(database, UNRESERVED));
                }
                if !self.options.is_empty() {
                    let query: Vec<String> = self
                        .options
                        .iter()
                        .map(|(key, value)| {
                            format!(
                                "{}={}",
                                percent_encode(key, UNRESERVED),
                                percent_encode(value, UNRESERVED)
                            )
                        })
                        .collect();
                    uri.push('?');
                    uri.push_str(&query.join("&"));
                }
                uri
            }
        }
    }

    /// Build and parse the descriptor
    pub fn build(&self) -> Result<ConnectionDescriptor> {
        ConnectionDescriptor::parse(&self.build_connection_string())
    }
}
