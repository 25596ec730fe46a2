use std::time::Duration;

use {
    monzo_common::{Error, Result, time::now_unix},
    monzo_config::ClientCredentials,
    reqwest::StatusCode,
    secrecy::{ExposeSecret, SecretString},
    serde::Deserialize,
    tracing::debug,
};

use crate::types::{Credential, TokenResponse};

pub const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns an authorization code or a refresh token into a [`Credential`].
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    client: ClientCredentials,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenExchanger {
    pub fn new(token_url: impl Into<String>, client: ClientCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client,
            timeout: TOKEN_EXCHANGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn exchange_code(&self, redirect_uri: &str, code: &str) -> Result<Credential> {
        debug!(token_url = %self.token_url, "exchanging authorization code");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.expose_secret().as_str()),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ])
        .await
    }

    /// Exchange a refresh token. When the server does not rotate the refresh
    /// token, the one passed in is kept on the returned credential.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        debug!(token_url = %self.token_url, "refreshing access token");
        let mut credential = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client.client_id.as_str()),
                ("client_secret", self.client.client_secret.expose_secret().as_str()),
                ("refresh_token", refresh_token),
            ])
            .await?;
        if credential.refresh_token().is_none() {
            credential.refresh_token = Some(SecretString::new(refresh_token.to_string()));
        }
        Ok(credential)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<Credential> {
        let resp = self
            .http
            .post(&self.token_url)
            .timeout(self.timeout)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            // Only used to enrich the error.
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ExchangeFailed {
                status: status.as_u16(),
                message: describe_error_body(&body, status),
            });
        }

        let body = resp.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|source| Error::DecodeFailed {
                what: "token response",
                source,
            })?;
        let credential = Credential::from_response(token, now_unix());
        debug!(
            user_id = %credential.user_id,
            expires_in = credential.expires_in,
            "received access token"
        );
        Ok(credential)
    }
}

fn describe_error_body(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(OAuthErrorBody {
            error,
            error_description: Some(description),
        }) if !description.is_empty() => format!("{error}: {description}"),
        Ok(OAuthErrorBody { error, .. }) => error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn client() -> ClientCredentials {
        ClientCredentials {
            client_id: "client_123".into(),
            client_secret: SecretString::new("secret_456".into()),
        }
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("client_id".into(), "client_123".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret_456".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "http://localhost:8080/callback".into(),
                ),
                Matcher::UrlEncoded("code".into(), "auth_code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"new_access","token_type":"Bearer","expires_in":21600,
                    "refresh_token":"new_refresh","scope":"","user_id":"user_123"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let before = now_unix();
        let cred = exchanger
            .exchange_code("http://localhost:8080/callback", "auth_code")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(cred.access_token.expose_secret(), "new_access");
        assert_eq!(cred.refresh_token(), Some("new_refresh"));
        assert_eq!(cred.user_id, "user_123");
        assert!(cred.expires_at >= before + 21600);
        assert!(cred.expires_at <= now_unix() + 21600);
    }

    #[tokio::test]
    async fn test_refresh_keeps_prior_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "old_refresh".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3600}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let cred = exchanger.refresh("old_refresh").await.unwrap();

        mock.assert_async().await;
        assert_eq!(cred.access_token.expose_secret(), "fresh");
        assert_eq!(cred.refresh_token(), Some("old_refresh"));
    }

    #[tokio::test]
    async fn test_refresh_rotates_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(
                r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3600,
                    "refresh_token":"rotated"}"#,
            )
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let cred = exchanger.refresh("old_refresh").await.unwrap();
        assert_eq!(cred.refresh_token(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_structured_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_grant","error_description":"Code has expired"}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let err = exchanger.exchange_code("http://x/cb", "c").await.unwrap_err();
        match err {
            Error::ExchangeFailed { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid_grant: Code has expired");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(502)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let err = exchanger.refresh("r").await.unwrap_err();
        assert!(matches!(err, Error::ExchangeFailed { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(format!("{}/oauth2/token", server.url()), client());
        let err = exchanger.exchange_code("http://x/cb", "c").await.unwrap_err();
        assert!(matches!(err, Error::DecodeFailed { .. }));
    }

    #[test]
    fn test_describe_error_body() {
        assert_eq!(
            describe_error_body(r#"{"error":"invalid_client"}"#, StatusCode::UNAUTHORIZED),
            "invalid_client"
        );
        assert_eq!(
            describe_error_body("upstream down", StatusCode::BAD_GATEWAY),
            "upstream down"
        );
        assert_eq!(describe_error_body("", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }
}
