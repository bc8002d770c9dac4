//! Credential token persistence
//!
//! A remembered login survives the process through a [`FileTokenStore`];
//! otherwise the token only lives in memory.

use panel_core::{ErrorContext, PanelError, PanelResult};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Durable home of the credential token
pub trait TokenStore: Send + Sync {
    fn load(&self) -> PanelResult<Option<String>>;
    fn save(&self, token: &str) -> PanelResult<()>;
    fn clear(&self) -> PanelResult<()>;
}

/// Keeps the token for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> PanelResult<Option<String>> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, token: &str) -> PanelResult<()> {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> PanelResult<()> {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// Stores the token in a single file, readable by the owner only on unix
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, operation: &str, error: std::io::Error) -> PanelError {
        PanelError::Storage {
            message: format!("Failed to {} token file {}: {}", operation, self.path.display(), error),
            source: Some(Box::new(error)),
            context: ErrorContext::new("file_token_store")
                .with_operation(operation)
                .with_suggestion("Check permissions of the panel config directory"),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> PanelResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error("read", e)),
        }
    }

    fn save(&self, token: &str) -> PanelResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error("create", e))?;
        }

        std::fs::write(&self.path, token).map_err(|e| self.storage_error("write", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.storage_error("protect", e))?;
        }

        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    fn clear(&self) -> PanelResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("panel").join("token"));

        assert_eq!(store.load().unwrap(), None);

        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn blank_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        assert_eq!(FileTokenStore::new(&path).load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn saved_token_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token"));
        store.save("secret").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_forgets_on_clear() {
        let store = MemoryTokenStore::new();
        store.save("t1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("t1"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
