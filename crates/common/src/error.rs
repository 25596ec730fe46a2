use std::{path::PathBuf, time::Duration};

/// Errors produced by the monzo client crates.
///
/// Every variant propagates to the command that triggered it; nothing is
/// retried or recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} is required. {hint}", hint = config_hint(.field))]
    ConfigMissing { field: &'static str },

    #[error("invalid config file {}: {source}", .path.display())]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine home directory")]
    HomeDirUnavailable,

    #[error("failed to start callback listener on port {port}: {source}")]
    ListenerBindFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("authorization denied: {error}: {description}")]
    AuthorizationDenied { error: String, description: String },

    #[error("no authorization code received")]
    NoCodeReceived,

    #[error("authorization callback carried an unexpected state value")]
    StateMismatch,

    #[error("authorization timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("token exchange failed with status {status}: {message}")]
    ExchangeFailed { status: u16, message: String },

    #[error("failed to decode {what}: {source}")]
    DecodeFailed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no stored credential at {}", .path.display())]
    CredentialNotFound { path: PathBuf },

    #[error("stored credential at {} is corrupt: {source}", .path.display())]
    CredentialCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("not logged in. Please run 'monzo login' first")]
    NotAuthenticated,

    #[error("access token expired and no refresh token is stored. Please run 'monzo login' again")]
    ExpiredNoRefresh,

    #[error("failed to refresh access token: {0}")]
    RefreshFailed(#[source] Box<Error>),

    #[error("API request failed with status {status}: {body}")]
    ApiRequestFailed { status: u16, body: String },

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn config_hint(field: &str) -> &'static str {
    match field {
        "client id" => {
            "Set MONZO_CLIENT_ID, add client_id to config.json, or pass --client-id to 'monzo login'"
        },
        "client secret" => {
            "Set MONZO_CLIENT_SECRET, add client_secret to config.json, or pass --client-secret to 'monzo login'"
        },
        "account id" => "Pass --account-id or set MONZO_ACCOUNT_ID",
        _ => "See 'monzo --help'",
    }
}
