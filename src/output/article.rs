//! Article writer
//!
//! Persists one document's outline records as a UTF-8 text file, one
//! `breadcrumb<TAB>body` line per record. Existing files are never
//! overwritten.

use crate::crawler::OutlineRecord;
use crate::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// File extension of written articles
pub const ARTICLE_EXTENSION: &str = "txt";

/// Longest file name most file systems accept, in bytes
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Writes articles into a single directory
#[derive(Debug, Clone)]
pub struct ArticleWriter {
    dir: PathBuf,
}

impl ArticleWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where an article titled `title` is written when its name is free
    pub fn path_hint(&self, title: &str) -> PathBuf {
        let stem = sanitize_title(title);
        let stem = truncate_to_boundary(&stem, MAX_FILE_NAME_BYTES - ARTICLE_EXTENSION.len() - 1);
        self.dir.join(format!("{}.{}", stem, ARTICLE_EXTENSION))
    }

    /// Writes `records` for the document titled `title`
    ///
    /// When the sanitized name is taken, the file is written as
    /// `<name>_<collision_suffix>.txt` instead (with a further counter if that
    /// is taken too). Returns the path actually written.
    pub fn write(
        &self,
        title: &str,
        records: &[OutlineRecord],
        collision_suffix: usize,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stem = sanitize_title(title);
        let (path, file) = self.create_unique(&stem, collision_suffix)?;

        let mut writer = BufWriter::new(file);
        for record in records {
            writeln!(
                writer,
                "{}\t{}",
                clean_field(&record.breadcrumb),
                clean_field(&record.body)
            )?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// Atomically claims a file name that does not exist yet
    ///
    /// Long stems are cut so that every candidate, suffix and extension
    /// included, fits in [`MAX_FILE_NAME_BYTES`].
    fn create_unique(&self, stem: &str, collision_suffix: usize) -> io::Result<(PathBuf, File)> {
        let suffixes = std::iter::once(String::new())
            .chain(std::iter::once(format!("_{}", collision_suffix)))
            .chain((1..=u16::MAX).map(|n| format!("_{}_{}", collision_suffix, n)));

        for suffix in suffixes {
            let reserved = suffix.len() + ARTICLE_EXTENSION.len() + 1;
            let name = format!(
                "{}{}",
                truncate_to_boundary(stem, MAX_FILE_NAME_BYTES - reserved),
                suffix
            );
            let path = self.dir.join(format!("{}.{}", name, ARTICLE_EXTENSION));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    if !suffix.is_empty() {
                        tracing::warn!(
                            "{}.{} already exists; writing {}",
                            stem,
                            ARTICLE_EXTENSION,
                            path.display()
                        );
                    }
                    return Ok((path, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}", stem),
        ))
    }
}

/// Turns a document title into a file-system-safe file stem
///
/// Spaces become underscores; path separators are percent-escaped so they
/// cannot collide with underscores.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.trim().chars() {
        match c {
            ' ' => out.push('_'),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    if out.is_empty() || out == "." || out == ".." {
        out = format!("untitled{}", out);
    }
    out
}

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char boundary
fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Tabs and newlines would break the line format
fn clean_field(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}
