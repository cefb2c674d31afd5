//! Saved login credentials.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use etcetera::base_strategy::{choose_base_strategy, BaseStrategy};
use serde::{Deserialize, Serialize};
use tracing::log::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub token: String,
}

pub trait CredentialStore {
    /// Returns `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<Credentials>>;
    fn save(&self, credentials: &Credentials) -> Result<()>;
    /// Forgets saved credentials. Wiping an empty store is not an error.
    fn wipe(&self) -> Result<()>;
}

/// Keeps credentials as JSON in a single file, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/fury/credentials.json` or the platform equivalent.
    pub fn default_location() -> Result<Self> {
        let strategy = choose_base_strategy()
            .context("Unable to locate the home directory")?;
        Ok(Self::new(
            strategy.config_dir().join("fury").join("credentials.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let raw = match fs::read(&self.path) {
            | Ok(raw) => raw,
            | Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            | Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.path.display())
                })
            }
        };
        let credentials = serde_json::from_slice(&raw).with_context(|| {
            format!("Malformed credentials file {}", self.path.display())
        })?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create {}", dir.display())
            })?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).with_context(|| {
            format!("Failed to open {}", self.path.display())
        })?;
        serde_json::to_writer_pretty(&mut file, credentials)?;
        file.write_all(b"\n")?;
        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    fn wipe(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            | Ok(()) => Ok(()),
            | Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            | Err(e) => {
                Err(e).with_context(|| {
                    format!("Failed to remove {}", self.path.display())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            email: "u@example.com".to_owned(),
            token: "token-abc-123".to_owned(),
        }
    }

    #[test]
    fn save_load_wipe() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            FileCredentialStore::new(dir.path().join("nested/credentials.json"));

        assert_eq!(None, store.load().unwrap());
        store.save(&creds()).unwrap();
        assert_eq!(Some(creds()), store.load().unwrap());

        store.wipe().unwrap();
        assert_eq!(None, store.load().unwrap());
        // Wiping twice is fine.
        store.wipe().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn credentials_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&creds()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(0o600, mode & 0o777);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        let err = FileCredentialStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Malformed credentials file"));
    }
}
