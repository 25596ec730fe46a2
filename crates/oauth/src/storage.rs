use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use monzo_common::{Error, Result};

use crate::types::Credential;

/// File-backed store for the single stored [`Credential`].
///
/// The directory is created owner-only (0700) and the file is written
/// owner-read/write (0600). There is no locking between processes; the last
/// writer wins.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at the default per-user location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(monzo_config::token_path()?))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Credential> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::CredentialNotFound {
                    path: self.path.clone(),
                });
            },
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|source| Error::CredentialCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the stored credential.
    ///
    /// Written to a sibling temp file first, then renamed over the target.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            create_private_dir(dir)?;
        }

        let data = serde_json::to_string_pretty(credential)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&tmp, &self.path, data.as_bytes()) {
            if let Err(cleanup) = fs::remove_file(&tmp)
                && cleanup.kind() != ErrorKind::NotFound
            {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp file");
            }
            return Err(e);
        }

        tracing::debug!(path = %self.path.display(), "saved credential");
        Ok(())
    }
}

fn write_then_rename(tmp: &Path, target: &Path, data: &[u8]) -> Result<()> {
    let mut file = open_private(tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)?;
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    if !dir.exists() {
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
        return Ok(());
    }
    // An existing directory may be shared; its mode is left alone.
    let mode = fs::metadata(dir)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        tracing::warn!(
            path = %dir.display(),
            mode = %format_args!("{mode:o}"),
            "credential directory is accessible to other users"
        );
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(unix)]
fn open_private(path: &Path) -> Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a stale temp file keeps its bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<fs::File> {
    Ok(fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}
