/// Download sinks for assembled documents

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait Downloader: Send + Sync {
    /// Hand `bytes` to the platform under the suggested `filename`
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes downloads into a directory
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileDownloader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for `filename`; directory components are not allowed.
    pub fn target_path(&self, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename);
        match name.file_name() {
            Some(base) if base == name.as_os_str() => Ok(self.dir.join(base)),
            _ => Err(Error::Other(format!("Invalid download filename: {:?}", filename))),
        }
    }
}

impl Downloader for FileDownloader {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.target_path(filename)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, bytes)?;
        log::info!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Keeps downloads in memory
pub struct MemoryDownloader {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        MemoryDownloader { files: Mutex::new(Vec::new()) }
    }

    /// All saved files in save order
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<(String, Vec<u8>)> {
        self.files().pop()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for MemoryDownloader {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| Error::Other("download store poisoned".into()))?;
        files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
