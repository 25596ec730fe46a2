use {
    monzo_common::{Error, Result, time::now_unix},
    monzo_config::CredentialSources,
    tracing::{debug, info},
};

use crate::{exchange::TokenExchanger, storage::TokenStore, types::Credential};

/// Hands out a usable credential to every authenticated command.
///
/// Expiry is checked lazily here and nowhere else: a stored credential is
/// either returned as-is, refreshed once and persisted, or rejected.
pub struct SessionLoader {
    store: TokenStore,
    token_url: String,
    client: CredentialSources,
}

impl SessionLoader {
    /// Client credentials are only resolved from `client` when a refresh is
    /// actually needed.
    pub fn new(
        store: TokenStore,
        token_url: impl Into<String>,
        client: CredentialSources,
    ) -> Self {
        Self {
            store,
            token_url: token_url.into(),
            client,
        }
    }

    pub async fn ensure_valid_credential(&self) -> Result<Credential> {
        let credential = match self.store.load() {
            Ok(credential) => credential,
            Err(Error::CredentialNotFound { path }) => {
                debug!(path = %path.display(), "no stored credential");
                return Err(Error::NotAuthenticated);
            },
            Err(e) => return Err(e),
        };

        if !credential.is_expired_at(now_unix()) {
            return Ok(credential);
        }

        let Some(refresh_token) = credential.refresh_token() else {
            return Err(Error::ExpiredNoRefresh);
        };
        let exchanger = TokenExchanger::new(self.token_url.clone(), self.client.resolve()?);

        info!(user_id = %credential.user_id, "access token expired, refreshing");
        let refreshed = exchanger
            .refresh(refresh_token)
            .await
            .map_err(|e| Error::RefreshFailed(Box::new(e)))?;
        self.store.save(&refreshed)?;
        info!(expires_at = refreshed.expires_at, "access token refreshed");

        Ok(refreshed)
    }
}
