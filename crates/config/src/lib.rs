pub mod credentials;
pub mod endpoints;
pub mod file;
pub mod paths;

pub use {
    credentials::{ClientCredentials, CredentialSources},
    endpoints::Endpoints,
    file::ConfigFile,
    paths::{config_dir, config_path, token_path},
};
