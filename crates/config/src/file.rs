use std::path::Path;

use {
    monzo_common::{Error, Result},
    secrecy::SecretString,
    serde::Deserialize,
};

/// Contents of `config.json`. Every field is optional; it is the lowest
/// precedence source for client credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
}

impl ConfigFile {
    /// Load the config file. A missing file yields an empty config; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|source| Error::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ConfigFile::load(&tmp.path().join("config.json")).unwrap();
        assert!(cfg.client_id.is_none());
        assert!(cfg.client_secret.is_none());
    }

    #[test]
    fn test_load_valid_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"client_id": "test_client_id", "client_secret": "test_client_secret"}"#,
        )
        .unwrap();

        let cfg = ConfigFile::load(&path).unwrap();
        assert_eq!(cfg.client_id.as_deref(), Some("test_client_id"));
        assert_eq!(
            cfg.client_secret.as_ref().map(|s| s.expose_secret().as_str()),
            Some("test_client_secret")
        );
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"client_id": "only_id"}"#).unwrap();

        let cfg = ConfigFile::load(&path).unwrap();
        assert_eq!(cfg.client_id.as_deref(), Some("only_id"));
        assert!(cfg.client_secret.is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "invalid json").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }
}
