use {
    monzo_common::{Error, Result},
    secrecy::{ExposeSecret, SecretString},
};

use crate::file::ConfigFile;

pub const CLIENT_ID_ENV: &str = "MONZO_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "MONZO_CLIENT_SECRET";

/// OAuth client credentials issued by the Monzo developer portal.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Every place a client credential can come from, gathered once per
/// invocation. Highest precedence first: flag, environment, config file.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub flag_client_id: Option<String>,
    pub flag_client_secret: Option<SecretString>,
    pub env_client_id: Option<String>,
    pub env_client_secret: Option<SecretString>,
    pub file: ConfigFile,
}

impl CredentialSources {
    /// Gather sources from explicit flags, the process environment and the
    /// given config file.
    pub fn gather(
        flag_client_id: Option<String>,
        flag_client_secret: Option<SecretString>,
        file: ConfigFile,
    ) -> Self {
        Self {
            flag_client_id,
            flag_client_secret,
            env_client_id: std::env::var(CLIENT_ID_ENV).ok(),
            env_client_secret: std::env::var(CLIENT_SECRET_ENV).ok().map(SecretString::new),
            file,
        }
    }

    /// Resolve both halves of the client credential. Empty values count as
    /// absent.
    pub fn resolve(&self) -> Result<ClientCredentials> {
        let client_id = first_non_empty([
            self.flag_client_id.as_deref(),
            self.env_client_id.as_deref(),
            self.file.client_id.as_deref(),
        ])
        .ok_or(Error::ConfigMissing { field: "client id" })?;

        let client_secret = first_non_empty([
            self.flag_client_secret.as_ref().map(|s| s.expose_secret().as_str()),
            self.env_client_secret.as_ref().map(|s| s.expose_secret().as_str()),
            self.file.client_secret.as_ref().map(|s| s.expose_secret().as_str()),
        ])
        .ok_or(Error::ConfigMissing {
            field: "client secret",
        })?;

        Ok(ClientCredentials {
            client_id: client_id.to_string(),
            client_secret: SecretString::new(client_secret.to_string()),
        })
    }
}

fn first_non_empty<'a>(candidates: [Option<&'a str>; 3]) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}
