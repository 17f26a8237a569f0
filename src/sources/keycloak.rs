use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::connection::ConnectionParams;
use crate::error::FetchError;
use crate::sources::{parse_token_response, TokenPayload, TokenSource};

const GRANT_TYPE: &str = "client_credentials";

/// Client-credentials grant against a Keycloak style realm endpoint.
#[derive(Debug, Clone, Default)]
pub struct KeycloakSource {
    client: Client,
}

impl KeycloakSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// `{scheme}://{server}:{port}/realms/{realm}/protocol/openid-connect/token`
pub fn token_endpoint(params: &ConnectionParams) -> Result<Url, FetchError> {
    let raw = format!(
        "{}://{}:{}/realms/{}/protocol/openid-connect/token",
        params.scheme, params.server, params.port, params.realm
    );
    Url::parse(&raw).map_err(|e| FetchError::Endpoint(format!("{}: {}", raw, e)))
}

impl TokenSource for KeycloakSource {
    async fn fetch_token(&self, params: &ConnectionParams) -> Result<TokenPayload, FetchError> {
        let url = token_endpoint(params)?;
        debug!("requesting token from {}", url);

        let form = [
            ("grant_type", GRANT_TYPE),
            ("client_id", params.client_id.as_str()),
            ("client_secret", params.client_secret.as_str()),
        ];
        let response = self.client.post(url).form(&form).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        parse_token_response(&body)
    }
}
