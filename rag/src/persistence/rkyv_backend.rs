//! rkyv-based binary persistence.

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{from_bytes, to_bytes};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};
use crate::types::IndexEntry;

use super::{PersistedIndex, Persistence};

/// File layout version written by this backend.
const FORMAT_VERSION: u32 = 1;

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
struct IndexFile {
    version: u32,
    dimension: u64,
    entries: Vec<EntryData>,
}

#[derive(Clone, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
struct EntryData {
    id: u64,
    embedding: Vec<f32>,
}

impl From<&IndexEntry> for EntryData {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            id: entry.id,
            embedding: entry.embedding.clone(),
        }
    }
}

impl From<EntryData> for IndexEntry {
    fn from(data: EntryData) -> Self {
        Self::new(data.id, data.embedding)
    }
}

/// Binary persistence using rkyv.
///
/// Saves go through a temporary file that is renamed over the target, so a crash during a
/// save leaves the previous snapshot intact.
///
/// ```rust,no_run
/// use seabrief_rag::persistence::{Persistence, RkyvPersistence};
///
/// let persistence = RkyvPersistence::new("vector_store/index.rkyv");
/// let snapshot = persistence.load().unwrap();
/// ```
#[derive(Debug)]
pub struct RkyvPersistence {
    path: PathBuf,
}

impl RkyvPersistence {
    /// Creates a new rkyv persistence backend.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for RkyvPersistence {
    fn save(&self, index: &PersistedIndex) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RagError::persistence(parent, e))?;
        }

        let file = IndexFile {
            version: FORMAT_VERSION,
            dimension: index.dimension as u64,
            entries: index.entries.iter().map(EntryData::from).collect(),
        };

        let bytes =
            to_bytes::<RkyvError>(&file).map_err(|e| RagError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, &bytes).map_err(|e| RagError::persistence(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| RagError::persistence(&self.path, e))?;

        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedIndex>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path).map_err(|e| RagError::persistence(&self.path, e))?;

        if bytes.is_empty() {
            return Ok(None);
        }

        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let file = from_bytes::<IndexFile, RkyvError>(&aligned)
            .map_err(|e| RagError::Serialization(e.to_string()))?;

        if file.version != FORMAT_VERSION {
            return Err(RagError::Serialization(format!(
                "unsupported index format version {}",
                file.version
            )));
        }

        let dimension = usize::try_from(file.dimension)
            .map_err(|e| RagError::Serialization(e.to_string()))?;

        Ok(Some(PersistedIndex {
            dimension,
            entries: file.entries.into_iter().map(IndexEntry::from).collect(),
        }))
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RagError::persistence(&self.path, e)),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
