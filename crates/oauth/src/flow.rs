use std::time::Duration;

use {
    monzo_common::Result,
    monzo_config::{ClientCredentials, Endpoints},
    tracing::info,
};

use crate::{
    authorize::{build_authorization_url, generate_state},
    callback_server::{CALLBACK_PATH, CALLBACK_TIMEOUT, CallbackServer, SHUTDOWN_GRACE},
    exchange::TokenExchanger,
    storage::TokenStore,
    types::{AuthorizationRequest, Credential},
};

/// Settings for one `login` invocation.
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub client: ClientCredentials,
    /// Defaults to `http://localhost:<port>/callback`.
    pub redirect_uri: Option<String>,
    pub port: u16,
    pub callback_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl LoginOptions {
    pub fn new(client: ClientCredentials, port: u16) -> Self {
        Self {
            client,
            redirect_uri: None,
            port,
            callback_timeout: CALLBACK_TIMEOUT,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

/// Browser-based authorization code login.
pub struct LoginFlow {
    options: LoginOptions,
    endpoints: Endpoints,
    exchanger: TokenExchanger,
}

impl LoginFlow {
    pub fn new(options: LoginOptions, endpoints: Endpoints) -> Self {
        let exchanger = TokenExchanger::new(endpoints.token_url.clone(), options.client.clone());
        Self {
            options,
            endpoints,
            exchanger,
        }
    }

    /// Run the login and persist the resulting credential.
    ///
    /// `present` is handed the authorization request once the callback
    /// listener is up; it is expected to send the user to `request.url`.
    /// Nothing is written to `store` unless the code exchange succeeds.
    pub async fn run<F>(&self, store: &TokenStore, present: F) -> Result<Credential>
    where
        F: FnOnce(&AuthorizationRequest),
    {
        let state = generate_state();
        let mut server = CallbackServer::bind(self.options.port, &state).await?;

        let result = self.authorize(&mut server, state, present).await;
        server.shutdown(self.options.shutdown_grace).await;
        let (redirect_uri, code) = result?;

        info!("authorization received, exchanging code for token");
        let credential = self.exchanger.exchange_code(&redirect_uri, &code).await?;
        store.save(&credential)?;
        info!(user_id = %credential.user_id, "login complete");

        Ok(credential)
    }

    async fn authorize<F>(
        &self,
        server: &mut CallbackServer,
        state: String,
        present: F,
    ) -> Result<(String, String)>
    where
        F: FnOnce(&AuthorizationRequest),
    {
        let redirect_uri = self
            .options
            .redirect_uri
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}{CALLBACK_PATH}", server.port()));

        let url = build_authorization_url(
            &self.endpoints.auth_url,
            &self.options.client.client_id,
            &redirect_uri,
            &state,
        )?;
        present(&AuthorizationRequest {
            url,
            redirect_uri: redirect_uri.clone(),
            callback_port: server.port(),
            state,
        });

        let code = server.wait(self.options.callback_timeout).await?;
        Ok((redirect_uri, code))
    }
}
