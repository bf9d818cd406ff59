// Registry persistence (~/.aws/kee.json)
use crate::error::{KeeError, Result};
use crate::fs::write_atomic;
use crate::models::Registry;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and saves the account registry; holds no state beyond the file path
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry from disk.
    ///
    /// A missing or unreadable file yields an empty registry. A file that
    /// exists but holds invalid JSON (including bytes that are not UTF-8) is
    /// a parse error, so a later save cannot clobber whatever the user has in there.
    pub fn load(&self) -> Result<Registry> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "Registry not found at {}, starting empty",
                    self.path.display()
                );
                return Ok(Registry::default());
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read registry at {}: {}. Starting empty",
                    self.path.display(),
                    e
                );
                return Ok(Registry::default());
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Registry::default());
        }

        tracing::debug!("Loading registry from: {}", self.path.display());
        serde_json::from_slice(&contents)
            .map_err(|e| KeeError::Parse(format!("{}: {}", self.path.display(), e)))
    }

    pub fn save(&self, registry: &Registry) -> Result<()> {
        let mut json = serde_json::to_string_pretty(registry)?;
        json.push('\n');
        write_atomic(&self.path, &json)?;
        tracing::debug!(
            "Saved {} account(s) to {}",
            registry.len(),
            self.path.display()
        );
        Ok(())
    }
}
