use {
    secrecy::{ExposeSecret, SecretString},
    serde::{Deserialize, Serialize, Serializer},
    url::Url,
};

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub user_id: String,
}

/// Stored credential, written to `token.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: SecretString,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub user_id: String,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
}

impl Credential {
    /// Build a credential from a token response received at `issued_at`.
    pub fn from_response(resp: TokenResponse, issued_at: i64) -> Self {
        Self {
            expires_at: issued_at.saturating_add(resp.expires_in),
            access_token: resp.access_token,
            token_type: resp.token_type,
            expires_in: resp.expires_in,
            refresh_token: resp.refresh_token,
            scope: resp.scope,
            user_id: resp.user_id,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// The refresh token, if one is stored and non-empty.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.is_empty())
    }
}

/// One-shot result of the browser redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied { error: String, description: String },
    MissingCode,
    StateMismatch,
}

/// Everything needed to send the user to the consent page for one login.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub redirect_uri: String,
    /// Port the callback listener actually bound.
    pub callback_port: u16,
    pub state: String,
}

pub fn serialize_secret<S: Serializer>(secret: &SecretString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret.expose_secret())
}

pub fn serialize_option_secret<S: Serializer>(
    secret: &Option<SecretString>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => s.serialize_some(secret.expose_secret()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: SecretString::new("access".into()),
            token_type: "Bearer".into(),
            expires_in: 21600,
            refresh_token: refresh.map(|r| SecretString::new(r.into())),
            scope: String::new(),
            user_id: "user_123".into(),
        }
    }

    #[test]
    fn test_expiry_derived_from_issue_time() {
        let cred = Credential::from_response(response(Some("refresh")), 1_700_000_000);
        assert_eq!(cred.expires_at, 1_700_021_600);
        assert!(!cred.is_expired_at(1_700_021_599));
        assert!(cred.is_expired_at(1_700_021_600));
    }

    #[test]
    fn test_empty_refresh_token_is_absent() {
        let cred = Credential::from_response(response(Some("")), 0);
        assert!(cred.refresh_token().is_none());
        let cred = Credential::from_response(response(None), 0);
        assert!(cred.refresh_token().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let cred = Credential::from_response(response(None), 100);
        let json: serde_json::Value = serde_json::to_value(&cred).unwrap();
        assert_eq!(json["access_token"], "access");
        assert_eq!(json["expires_at"], 21700);
        assert!(json.get("refresh_token").is_none());

        let cred = Credential::from_response(response(Some("refresh")), 100);
        let json: serde_json::Value = serde_json::to_value(&cred).unwrap();
        assert_eq!(json["refresh_token"], "refresh");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let cred = Credential::from_response(response(Some("refresh")), 0);
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("\"access\""));
        assert!(!dbg.contains("\"refresh\""));
    }
}
