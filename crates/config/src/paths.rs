use std::path::PathBuf;

use monzo_common::{Error, Result};

/// Environment variable that overrides the per-user config directory.
pub const CONFIG_DIR_ENV: &str = "MONZO_CONFIG_DIR";

const CONFIG_DIR_NAME: &str = ".monzo";
const TOKEN_FILE: &str = "token.json";
const CONFIG_FILE: &str = "config.json";

/// Per-user directory holding the stored credential and `config.json`.
///
/// `MONZO_CONFIG_DIR` wins when set and non-empty; otherwise `~/.monzo`.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = directories::BaseDirs::new().ok_or(Error::HomeDirUnavailable)?;
    Ok(home.home_dir().join(CONFIG_DIR_NAME))
}

pub fn token_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(TOKEN_FILE))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}
