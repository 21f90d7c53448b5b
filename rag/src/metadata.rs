//! The append-only JSON-lines metadata log.
//!
//! Line `N` of the log describes the vector with ID `N`. The log is the source of truth for
//! rebuilding the index, so writes either land completely or not at all.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};
use crate::types::MetadataRecord;

/// The parsed content of the log, with line positions preserved.
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    /// One slot per line; `None` where the line could not be parsed.
    pub records: Vec<Option<MetadataRecord>>,
    /// Number of lines that could not be parsed.
    pub malformed: usize,
}

impl MetadataSnapshot {
    /// Number of lines in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at a line position, if the line exists and parsed.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&MetadataRecord> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.records.get(idx))
            .and_then(Option::as_ref)
    }

    /// Parsed records with their line positions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MetadataRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(line, record)| record.as_ref().map(|record| (line, record)))
    }

    /// Checks that every record carrying an ID sits on the matching line.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IdMismatch`] for the first misplaced record.
    pub fn validate_ids(&self) -> Result<()> {
        for (line, record) in self.iter() {
            if let Some(id) = record.id {
                if usize::try_from(id).ok() != Some(line) {
                    return Err(RagError::IdMismatch { line, id });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, record: MetadataRecord) {
        self.records.push(Some(record));
    }
}

/// Handle to the metadata log file.
#[derive(Debug, Clone)]
pub struct MetadataLog {
    path: PathBuf,
}

impl MetadataLog {
    /// Creates a handle for the log at `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the log in bytes, zero if missing.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Appends one JSON line per record in a single write and returns the file length before
    /// the write, for use with [`truncate_to`](Self::truncate_to).
    ///
    /// If the write fails the file is truncated back to its previous length.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] when the file cannot be opened or written.
    pub fn append(&self, records: &[MetadataRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(self.size_bytes());
        }

        let mut buffer = String::new();
        for record in records {
            let line =
                serde_json::to_string(record).map_err(|e| RagError::Serialization(e.to_string()))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RagError::persistence(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| RagError::persistence(&self.path, e))?;

        let previous_len = file
            .metadata()
            .map_err(|e| RagError::persistence(&self.path, e))?
            .len();

        if previous_len > 0 && !ends_with_newline(&mut file, previous_len) {
            buffer.insert(0, '\n');
        }

        let written = file
            .write_all(buffer.as_bytes())
            .and_then(|()| file.sync_data());

        if let Err(err) = written {
            if let Err(rollback) = file.set_len(previous_len) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial metadata append"
                );
            }
            return Err(RagError::persistence(&self.path, err));
        }

        Ok(previous_len)
    }

    /// Cuts the log back to `len` bytes, undoing appends made after that length was observed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] when the file cannot be opened or truncated.
    pub fn truncate_to(&self, len: u64) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| file.set_len(len).and_then(|()| file.sync_data()))
            .map_err(|e| RagError::persistence(&self.path, e))
    }

    /// Reads and parses every line. Unparseable lines are counted and kept as empty slots.
    ///
    /// A missing file reads as an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] when the file exists but cannot be read.
    pub fn read_all(&self) -> Result<MetadataSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MetadataSnapshot::default());
            }
            Err(e) => return Err(RagError::persistence(&self.path, e)),
        };

        let mut snapshot = MetadataSnapshot::default();
        for (line_no, line) in content.trim_end().lines().enumerate() {
            match serde_json::from_str::<MetadataRecord>(line.trim()) {
                Ok(record) => snapshot.records.push(Some(record)),
                Err(source) => {
                    let err = RagError::Parse {
                        line: line_no,
                        source,
                    };
                    tracing::warn!(path = %self.path.display(), error = %err, "Skipping metadata line");
                    snapshot.records.push(None);
                    snapshot.malformed += 1;
                }
            }
        }
        Ok(snapshot)
    }

    /// Number of lines in the log.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] when the file exists but cannot be read.
    pub fn line_count(&self) -> Result<usize> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim_end().lines().count()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(RagError::persistence(&self.path, e)),
        }
    }

    /// Copies the log to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if the copy fails.
    pub fn backup_to(&self, target: &Path) -> Result<()> {
        fs::copy(&self.path, target).map_err(|e| RagError::persistence(target, e))?;
        Ok(())
    }

    /// Replaces the log with the file at `source`, consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if the file cannot be moved into place.
    pub fn restore_from(&self, source: &Path) -> Result<()> {
        fs::rename(source, &self.path).map_err(|e| RagError::persistence(&self.path, e))
    }

    /// Deletes the log file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RagError::persistence(&self.path, e)),
        }
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> bool {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))
        .and_then(|_| file.read_exact(&mut last))
        .map(|()| last[0] == b'\n')
        .unwrap_or(true)
}
