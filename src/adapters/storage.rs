use crate::domain::ports::TargetStore;
use crate::utils::error::{Result, SdError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores the target document at a fixed path, replacing it by rename.
#[derive(Debug, Clone)]
pub struct AtomicFileStore {
    path: PathBuf,
    tmp_prefix: String,
}

impl AtomicFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "targets.json".to_string());
        // 隱藏檔且副檔名為 .tmp，避免被 file_sd 的 *.json 比對到
        let tmp_prefix = format!(".{}.", file_name);

        Self { path, tmp_prefix }
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Writes `data` to a uniquely named file next to the target.
    fn write_tmp(&self, data: &[u8]) -> io::Result<NamedTempFile> {
        let mut tmp = tempfile::Builder::new()
            .prefix(&self.tmp_prefix)
            .suffix(".tmp")
            .tempfile_in(self.dir())?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn fs_error(&self, source: io::Error) -> SdError {
        SdError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl TargetStore for AtomicFileStore {
    fn location(&self) -> &Path {
        &self.path
    }

    async fn read_current(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.fs_error(e)),
        }
    }

    async fn replace(&self, data: &[u8]) -> Result<()> {
        fs::create_dir_all(self.dir()).map_err(|e| self.fs_error(e))?;

        // A temp file that fails to write or persist is removed on drop
        let tmp = self.write_tmp(data).map_err(|e| self.fs_error(e))?;

        // The watcher sees either the old file or the complete new one
        tmp.persist(&self.path)
            .map_err(|e| self.fs_error(e.error))?;

        Ok(())
    }
}
