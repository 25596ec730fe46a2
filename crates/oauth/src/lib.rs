pub mod authorize;
pub mod callback_server;
pub mod exchange;
pub mod flow;
pub mod session;
pub mod storage;
pub mod types;

pub use {
    authorize::{build_authorization_url, generate_state},
    callback_server::CallbackServer,
    exchange::TokenExchanger,
    flow::{LoginFlow, LoginOptions},
    session::SessionLoader,
    storage::TokenStore,
    types::{AuthorizationRequest, CallbackOutcome, Credential, TokenResponse},
};
