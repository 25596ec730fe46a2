/// Remote hosts the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Consent page the user's browser is sent to.
    pub auth_url: String,
    /// Server-to-server token endpoint.
    pub token_url: String,
    /// Base URL of the banking API.
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://auth.monzo.com".to_string(),
            token_url: "https://api.monzo.com/oauth2/token".to_string(),
            api_url: "https://api.monzo.com".to_string(),
        }
    }
}
