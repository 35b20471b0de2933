/*!
 * Durable storage for the glossary.
 *
 * The persisted form is a single pretty-printed JSON document so operators
 * can hand-edit entries between runs. `JsonFileStorage` replaces the file
 * atomically (temp file in the same directory, fsync, rename);
 * `MemoryStorage` keeps the document in memory for tests and dry runs.
 */

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::NamedTempFile;

use crate::errors::GlossaryError;

use super::entry::{GlossaryEntry, ProposalRecord};

/// Current persisted format version
pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// The persisted glossary: entries plus the proposal log.
///
/// `entries` is required and unknown keys are rejected, so a file of some
/// other shape fails to load instead of reading as an empty glossary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlossaryDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    pub entries: Vec<GlossaryEntry>,

    #[serde(default)]
    pub proposals: Vec<ProposalRecord>,
}

impl Default for GlossaryDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: Vec::new(),
            proposals: Vec::new(),
        }
    }
}

impl GlossaryDocument {
    /// Parse a document from its JSON text.
    pub fn from_json(text: &str, location: &str) -> Result<Self, GlossaryError> {
        let document: Self = serde_json::from_str(text).map_err(|e| GlossaryError::Corrupt {
            location: location.to_string(),
            message: e.to_string(),
        })?;

        if document.version > FORMAT_VERSION {
            return Err(GlossaryError::Corrupt {
                location: location.to_string(),
                message: format!(
                    "format version {} is newer than supported version {}",
                    document.version, FORMAT_VERSION
                ),
            });
        }

        Ok(document)
    }

    /// Render the document as human-editable JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Where the glossary lives between runs.
pub trait GlossaryStorage: Send + Sync {
    /// Read the persisted document. `Ok(None)` means nothing was persisted yet.
    fn load(&self) -> Result<Option<GlossaryDocument>, GlossaryError>;

    /// Replace the persisted document. Must never leave a partial document behind.
    fn flush(&self, document: &GlossaryDocument) -> Result<(), GlossaryError>;

    /// Human-readable location for logs and errors
    fn location(&self) -> String;
}

/// Glossary stored as a JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, message: impl ToString) -> GlossaryError {
        GlossaryError::Persistence {
            location: self.location(),
            message: message.to_string(),
        }
    }
}

impl GlossaryStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<GlossaryDocument>, GlossaryError> {
        if !self.path.exists() {
            debug!("No glossary at {:?} yet, starting empty", self.path);
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path).map_err(|e| GlossaryError::Corrupt {
            location: self.location(),
            message: e.to_string(),
        })?;

        GlossaryDocument::from_json(&text, &self.location()).map(Some)
    }

    fn flush(&self, document: &GlossaryDocument) -> Result<(), GlossaryError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| self.persistence_error(e))?;

        let json = document.to_json().map_err(|e| self.persistence_error(e))?;

        // The temp file must share a filesystem with the target for the rename to be atomic
        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| self.persistence_error(e))?;
        temp.write_all(json.as_bytes())
            .and_then(|_| temp.write_all(b"\n"))
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.persistence_error(e))?;
        temp.persist(&self.path).map_err(|e| self.persistence_error(e.error))?;

        debug!(
            "Flushed glossary to {:?} ({} entries, {} proposals)",
            self.path,
            document.entries.len(),
            document.proposals.len()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory storage with switchable flush failures
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<GlossaryDocument>>,
    fail_flushes: AtomicBool,
    flush_count: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted document
    pub fn with_document(document: GlossaryDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Make every following flush fail (or succeed again)
    pub fn set_fail_flushes(&self, fail: bool) {
        self.fail_flushes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful flushes so far
    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }

    /// The last successfully flushed document
    pub fn persisted(&self) -> Option<GlossaryDocument> {
        self.document.lock().clone()
    }
}

impl GlossaryStorage for MemoryStorage {
    fn load(&self) -> Result<Option<GlossaryDocument>, GlossaryError> {
        Ok(self.document.lock().clone())
    }

    fn flush(&self, document: &GlossaryDocument) -> Result<(), GlossaryError> {
        if self.fail_flushes.load(Ordering::SeqCst) {
            return Err(GlossaryError::Persistence {
                location: self.location(),
                message: "simulated storage failure".to_string(),
            });
        }
        *self.document.lock() = Some(document.clone());
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
