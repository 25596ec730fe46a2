use std::time::Duration;

use {
    monzo_common::{Error, Result},
    monzo_oauth::Credential,
    secrecy::{ExposeSecret, SecretString},
    tracing::debug,
};

pub const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the banking API. Responses are returned as the raw
/// JSON text the server sent.
pub struct MonzoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: SecretString,
    timeout: Duration,
}

impl MonzoClient {
    pub fn new(base_url: impl Into<String>, credential: &Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: credential.access_token.clone(),
            timeout: API_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `GET /accounts`
    pub async fn accounts(&self) -> Result<String> {
        self.get("/accounts", &[]).await
    }

    /// `GET /balance?account_id=…`
    pub async fn balance(&self, account_id: &str) -> Result<String> {
        self.get("/balance", &[("account_id", account_id)]).await
    }

    /// `GET /transactions?expand[]=merchant&account_id=…`
    pub async fn transactions(&self, account_id: &str) -> Result<String> {
        self.get("/transactions", &[
            ("expand[]", "merchant"),
            ("account_id", account_id),
        ])
        .await
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!(path, "API request");
        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .bearer_auth(self.access_token.expose_secret())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            // Only used to enrich the error.
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ApiRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str::<serde_json::Value>(&body).map_err(|source| {
            Error::DecodeFailed {
                what: "API response",
                source,
            }
        })?;
        Ok(body)
    }
}
