use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use photoswap_core::{LevelId, MemoryProgress, ProgressBlob, ProgressError, ProgressStore};

/// Best times kept in memory and written through to a single file.
#[derive(Debug)]
pub(crate) struct FileProgress {
    path: PathBuf,
    records: MemoryProgress,
}

impl FileProgress {
    /// Opens the progress file. A missing or unreadable file starts empty.
    pub(crate) fn open(path: &Path) -> Self {
        let records = match load(path) {
            Ok(Some(blob)) => MemoryProgress::from_blob(&blob),
            Ok(None) => MemoryProgress::new(),
            Err(err) => {
                log::warn!("discarding progress at {}: {}", path.display(), err);
                MemoryProgress::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            records,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = (LevelId, f32)> + '_ {
        self.records.records()
    }

    pub(crate) fn save(&self) -> Result<(), ProgressError> {
        let bytes = self.records.to_blob().encode()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    pub(crate) fn reset(&mut self) -> Result<(), ProgressError> {
        self.records.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ProgressStore for FileProgress {
    fn best_time(&self, level_id: LevelId) -> Option<f32> {
        self.records.best_time(level_id)
    }

    fn set_best_time(&mut self, level_id: LevelId, time: f32) {
        self.records.set_best_time(level_id, time);
        if let Err(err) = self.save() {
            log::error!("failed to save progress to {}: {}", self.path.display(), err);
        }
    }
}

fn load(path: &Path) -> Result<Option<ProgressBlob>, ProgressError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    ProgressBlob::decode(&bytes).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photoswap-{name}-{}.bin", std::process::id()))
    }

    #[test]
    fn best_times_survive_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let mut progress = FileProgress::open(&path);
        assert!(progress.best_time(1).is_none());
        progress.set_best_time(1, 42.5);
        progress.set_best_time(2, 70.0);

        let reopened = FileProgress::open(&path);
        assert_eq!(reopened.best_time(1), Some(42.5));
        assert_eq!(reopened.records().count(), 2);

        let mut reopened = reopened;
        reopened.reset().expect("reset");
        assert!(!path.exists());
        assert!(FileProgress::open(&path).best_time(1).is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, b"garbage").expect("write");
        let progress = FileProgress::open(&path);
        assert_eq!(progress.records().count(), 0);
        let _ = fs::remove_file(&path);
    }
}
