//! JSON Lines dataset implementation

use crate::record::ProfessorRecord;
use crate::storage::StorageResult;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only dataset stored as one JSON object per line
///
/// Clones share the same write guard, so every writer in the process is
/// serialized on the open-append-close sequence of a single record.
#[derive(Debug, Clone)]
pub struct JsonlDataset {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlDataset {
    /// Creates a dataset handle; the file itself is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the dataset file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the dataset file
    pub fn storage_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Whether the dataset file exists yet
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Appends one record as a single line
    ///
    /// The line is fully serialized before the guard is taken, and written
    /// with one `write_all` so concurrent callers never interleave partial
    /// lines.
    pub async fn append(&self, record: &ProfessorRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let dir = self.storage_dir();
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Counts lines in the dataset, 0 when the file does not exist
    pub fn count_records(&self) -> io::Result<u64> {
        let Some(reader) = self.open_reader()? else {
            return Ok(0);
        };

        let mut count = 0;
        for segment in reader.split(b'\n') {
            segment?;
            count += 1;
        }
        Ok(count)
    }

    /// Returns up to `limit` leading lines, trimmed, or `None` when the file
    /// does not exist
    pub fn peek(&self, limit: usize) -> io::Result<Option<Vec<String>>> {
        let Some(reader) = self.open_reader()? else {
            return Ok(None);
        };

        let mut lines = Vec::with_capacity(limit);
        for segment in reader.split(b'\n').take(limit) {
            let bytes = segment?;
            lines.push(String::from_utf8_lossy(&bytes).trim().to_string());
        }
        Ok(Some(lines))
    }

    /// Scans the dataset for the largest `professor_id`
    ///
    /// Lines that are not JSON objects or lack a usable identifier are
    /// skipped. Returns `None` for a missing or empty dataset.
    pub fn max_professor_id(&self) -> io::Result<Option<u64>> {
        let Some(reader) = self.open_reader()? else {
            return Ok(None);
        };

        let mut max_id: Option<u64> = None;
        for segment in reader.split(b'\n') {
            let bytes = segment?;
            if let Some(id) = parse_professor_id(&bytes) {
                max_id = Some(max_id.map_or(id, |current| current.max(id)));
            }
        }
        Ok(max_id)
    }

    /// Lists file names in the dataset's directory, sorted
    ///
    /// A missing directory yields an empty listing.
    pub fn list_storage_dir(&self) -> io::Result<Vec<String>> {
        let entries = match std::fs::read_dir(self.storage_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn open_reader(&self) -> io::Result<Option<BufReader<File>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Extracts `professor_id` from one dataset line, accepting integers and
/// integer strings
fn parse_professor_id(line: &[u8]) -> Option<u64> {
    let value: Value = serde_json::from_slice(line).ok()?;
    match value.get("professor_id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
