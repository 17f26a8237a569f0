use std::fmt;

use serde::Deserialize;

use crate::error::TokenError;

pub fn default_scheme() -> String {
    "http".to_owned()
}

pub fn default_server() -> String {
    "localhost".to_owned()
}

pub fn default_port() -> u16 {
    8080
}

/// Identity provider coordinates as they arrive from YAML or the builder.
/// Every field may be absent here; [`ConnectionConfig::validate`] decides.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectionConfig {
    pub scheme: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ConnectionConfig {
    /// Fill server, port and scheme with the package defaults when unset.
    pub fn with_defaults(mut self) -> Self {
        self.scheme.get_or_insert_with(default_scheme);
        self.server.get_or_insert_with(default_server);
        self.port.get_or_insert_with(default_port);
        self
    }

    /// Names of all required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();

        let mut missing = Vec::new();
        if blank(&self.server) {
            missing.push("server");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        if blank(&self.realm) {
            missing.push("realm");
        }
        if blank(&self.client_id) {
            missing.push("client_id");
        }
        if blank(&self.client_secret) {
            missing.push("client_secret");
        }
        missing
    }

    /// Turn into immutable [`ConnectionParams`] or report every missing field at once.
    pub fn validate(self) -> Result<ConnectionParams, TokenError> {
        let missing = self.missing_fields();
        let ConnectionConfig {
            scheme,
            server: Some(server),
            port: Some(port),
            realm: Some(realm),
            client_id: Some(client_id),
            client_secret: Some(client_secret),
        } = self
        else {
            return Err(TokenError::MissingFields(missing));
        };
        // blank values are present but still missing
        if !missing.is_empty() {
            return Err(TokenError::MissingFields(missing));
        }

        Ok(ConnectionParams {
            scheme: scheme.unwrap_or_else(default_scheme),
            server,
            port,
            realm,
            client_id,
            client_secret,
        })
    }
}

/// Validated connection parameters handed to every token source call.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub scheme: String,
    pub server: String,
    pub port: u16,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("scheme", &self.scheme)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}
