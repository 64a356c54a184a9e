//! JSON document store: `<root>/<category>/<kind>.json`.
//!
//! Writes go to a temp file in the same directory and are renamed into place.
//! Readers and writers of one category serialize on an advisory lock file.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fd_lock::RwLock;
use serde_json::Value;
use specbrain_core::errors::{ArtifactError, BrainResult};

use super::{sanitize_segment, ArtifactStore};

const LOCK_FILE: &str = ".lock";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct JsonArtifactStore {
    root: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(sanitize_segment(category))
    }

    pub fn document_path(&self, category: &str, kind: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.json", sanitize_segment(kind)))
    }

    fn lock_file(&self, category: &str) -> Result<RwLock<File>, ArtifactError> {
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| ArtifactError::Lock {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(RwLock::new(file))
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn name(&self) -> &'static str {
        "json"
    }

    fn load(&self, category: &str, kind: &str) -> BrainResult<Option<Value>> {
        let path = self.document_path(category, kind);
        if !path.exists() {
            return Ok(None);
        }
        let lock = self.lock_file(category)?;
        let _guard = lock.read().map_err(|e| ArtifactError::Lock {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e).into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&text).map_err(|e| ArtifactError::Parse {
            kind: kind.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }

    fn save(&self, category: &str, kind: &str, document: &Value) -> BrainResult<()> {
        let path = self.document_path(category, kind);
        let body = serde_json::to_vec_pretty(document).map_err(|e| ArtifactError::Serialize {
            kind: kind.to_string(),
            message: e.to_string(),
        })?;

        let mut lock = self.lock_file(category)?;
        let _guard = lock.write().map_err(|e| ArtifactError::Lock {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        write_atomic(&path, &body)?;
        tracing::trace!(path = %path.display(), bytes = body.len(), "artifact written");
        Ok(())
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<(), ArtifactError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(body)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
