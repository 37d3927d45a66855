//! Visited registry: at-most-once processing per crawl session
//!
//! Documents are remembered under two keys, their canonical URL and their
//! canonical title, so a page reached once through `/wiki/Due_process` and
//! once through the seed title "Due process" is only processed once.

use crate::url::{normalize_title, DocumentId};
use crate::Result;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the URL set snapshot
pub const URL_SNAPSHOT: &str = "visited_urls.json";

/// File name of the title set snapshot
pub const TITLE_SNAPSHOT: &str = "visited_titles.json";

/// Dual-keyed membership set scoped to one crawl session
#[derive(Debug, Clone)]
pub struct VisitedRegistry {
    urls: HashSet<String>,
    titles: HashSet<String>,
    content_root: String,
}

impl VisitedRegistry {
    /// Creates an empty registry for a wiki whose articles live under `content_root`
    pub fn new(content_root: impl Into<String>) -> Self {
        Self {
            urls: HashSet::new(),
            titles: HashSet::new(),
            content_root: content_root.into(),
        }
    }

    /// Returns true if the canonical form of `id` has already been processed
    pub fn is_seen(&self, id: &DocumentId) -> bool {
        match id {
            DocumentId::Url(url) => {
                self.urls.contains(url.as_str())
                    || id
                        .title_hint(&self.content_root)
                        .is_some_and(|title| self.titles.contains(&title))
            }
            DocumentId::Title(title) => self.titles.contains(title),
        }
    }

    /// Returns true if a document with this display title has been processed
    pub fn is_title_seen(&self, title: &str) -> bool {
        normalize_title(title).is_some_and(|t| self.titles.contains(&t))
    }

    /// Records `id` under every key it can be derived to
    pub fn mark_seen(&mut self, id: &DocumentId) {
        if let Some(title) = id.title_hint(&self.content_root) {
            self.titles.insert(title);
        }
        if let DocumentId::Url(url) = id {
            self.urls.insert(url.to_string());
        }
    }

    /// Records a fetched document's resolved URL together with its display title
    pub fn mark_resolved(&mut self, resolved: &DocumentId, title: &str) {
        self.mark_seen(resolved);
        if let Some(title) = normalize_title(title) {
            self.titles.insert(title);
        }
    }

    /// Number of distinct URLs recorded
    pub fn url_count(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if neither a URL nor a title has been recorded
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.titles.is_empty()
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    /// Writes both key sets as sorted JSON lists into `dir`
    ///
    /// Returns the paths of the URL and title snapshots.
    pub fn write_snapshots(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)?;
        let url_path = dir.join(URL_SNAPSHOT);
        let title_path = dir.join(TITLE_SNAPSHOT);

        write_sorted(&url_path, &self.urls)?;
        write_sorted(&title_path, &self.titles)?;

        Ok((url_path, title_path))
    }

    /// Loads a registry from snapshots written by a previous run
    ///
    /// Missing snapshot files load as empty sets.
    pub fn load_snapshots(dir: &Path, content_root: impl Into<String>) -> Result<Self> {
        let mut registry = Self::new(content_root);
        registry.urls = read_set(&dir.join(URL_SNAPSHOT))?;
        registry.titles = read_set(&dir.join(TITLE_SNAPSHOT))?;
        Ok(registry)
    }
}

fn write_sorted(path: &Path, set: &HashSet<String>) -> Result<()> {
    let mut entries: Vec<&String> = set.iter().collect();
    entries.sort();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &entries)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_set(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let entries: Vec<String> = serde_json::from_reader(reader)?;
    Ok(entries.into_iter().collect())
}
