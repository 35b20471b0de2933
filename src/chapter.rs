/*!
 * Crawled chapter files.
 *
 * The crawler writes one `chapter_NNNN.json` per chapter; only the fields the
 * glossary needs are read here, everything else in the file is ignored.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::file_utils::FileManager;

/// A crawled source-language chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Ordinal chapter index, used as the glossary unit index
    pub chapter_number: u64,

    #[serde(default)]
    pub title_chinese: String,

    pub content_chinese: String,
}

impl Chapter {
    pub fn new(chapter_number: u64, title: &str, content: &str) -> Self {
        Self {
            chapter_number,
            title_chinese: title.to_string(),
            content_chinese: content.to_string(),
        }
    }

    /// Title and body, the text names are extracted from
    pub fn text(&self) -> String {
        if self.title_chinese.is_empty() {
            return self.content_chinese.clone();
        }
        format!("{}\n{}", self.title_chinese, self.content_chinese)
    }

    /// Read one chapter file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = FileManager::read_to_string(&path)?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse chapter file: {:?}", path.as_ref()))
    }

    /// Read every chapter file in `dir`, ordered by chapter number.
    /// `limit` keeps only the first chapters.
    pub fn load_dir<P: AsRef<Path>>(dir: P, limit: Option<usize>) -> Result<Vec<Self>> {
        let mut chapters = FileManager::find_chapter_files(&dir)?
            .iter()
            .map(Self::load)
            .collect::<Result<Vec<_>>>()?;

        chapters.sort_by_key(|c| c.chapter_number);
        if let Some(limit) = limit {
            chapters.truncate(limit);
        }
        Ok(chapters)
    }
}
