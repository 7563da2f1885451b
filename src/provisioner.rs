//! Data directory creation and teardown.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::info;

use crate::FilesystemError;
use crate::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemProvisioner;

impl FilesystemProvisioner {
    pub fn new() -> Self {
        Self
    }

    /// Creates `path` and every missing parent.
    pub async fn ensure_dir(
        &self,
        path: &Path,
    ) -> Result<()> {
        debug!("Create data folder: {}", path.display());
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| FilesystemError::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Recursively deletes `base_folder`.
    ///
    /// Callers must only purge once every node process using the folder has exited.
    /// A missing folder is already purged and is not an error.
    pub async fn purge(
        &self,
        base_folder: &Path,
    ) -> Result<()> {
        match tokio::fs::remove_dir_all(base_folder).await {
            Ok(()) => {
                info!("Removed {}", base_folder.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} already absent", base_folder.display());
                Ok(())
            }
            Err(source) => Err(FilesystemError::Remove {
                path: base_folder.to_path_buf(),
                source,
            }
            .into()),
        }
    }

    /// Replaces the contents of `path`, creating parent directories as needed.
    pub async fn write_file(
        &self,
        path: &Path,
        contents: &[u8],
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent).await?;
        }
        tokio::fs::write(path, contents)
            .await
            .map_err(|source| FilesystemError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Appends to `path`, creating it (and its parents) if absent.
    pub async fn append_file(
        &self,
        path: &Path,
        contents: &[u8],
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent).await?;
        }
        let map_err = |source| FilesystemError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(map_err)?;
        file.write_all(contents).await.map_err(map_err)?;
        file.flush().await.map_err(map_err)?;
        Ok(())
    }
}
