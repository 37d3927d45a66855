//! Outline extraction
//!
//! Converts a flat stream of heading and text events into
//! `(breadcrumb, body)` records. The breadcrumb is the `" - "`-joined path of
//! headings in scope; body text accumulates until the next heading flushes it.

/// Lowest heading level tracked in a breadcrumb (`<h2>`)
pub const MIN_HEADING_LEVEL: u8 = 2;

/// Highest heading level tracked in a breadcrumb (`<h6>`)
pub const MAX_HEADING_LEVEL: u8 = 6;

const SLOTS: usize = (MAX_HEADING_LEVEL - MIN_HEADING_LEVEL + 1) as usize;

/// Separator between breadcrumb segments
pub const BREADCRUMB_SEPARATOR: &str = " - ";

/// One line of a document's body stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingEvent {
    /// A section heading at `level` (2..=6)
    Heading { level: u8, label: String },
    /// A plain line of body text
    Text(String),
}

impl HeadingEvent {
    /// Creates a heading event, clamping the level into 2..=6
    pub fn heading(level: u8, label: impl Into<String>) -> Self {
        Self::Heading {
            level: level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL),
            label: label.into(),
        }
    }

    pub fn text(line: impl Into<String>) -> Self {
        Self::Text(line.into())
    }
}

/// One `(breadcrumb, body)` pair extracted from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRecord {
    pub breadcrumb: String,
    pub body: String,
}

impl OutlineRecord {
    pub fn new(breadcrumb: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            breadcrumb: breadcrumb.into(),
            body: body.into(),
        }
    }
}

/// Heading-hierarchy state machine for one document
///
/// Records are emitted in document order. A heading whose label contains one
/// of the terminal markers (case-insensitive) flushes the pending record and
/// ends extraction for the document.
#[derive(Debug)]
pub struct OutlineExtractor {
    title: String,
    terminal_markers: Vec<String>,
    breadcrumb: [Option<String>; SLOTS],
    description: String,
    records: Vec<OutlineRecord>,
    finished: bool,
}

impl OutlineExtractor {
    pub fn new(title: impl Into<String>, terminal_markers: &[String]) -> Self {
        Self {
            title: title.into(),
            terminal_markers: terminal_markers.iter().map(|m| m.to_lowercase()).collect(),
            breadcrumb: Default::default(),
            description: String::new(),
            records: Vec::new(),
            finished: false,
        }
    }

    /// Feeds one event; returns false once a terminal section has been reached
    pub fn push(&mut self, event: HeadingEvent) -> bool {
        if self.finished {
            return false;
        }

        match event {
            HeadingEvent::Text(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    if !self.description.is_empty() {
                        self.description.push(' ');
                    }
                    self.description.push_str(line);
                }
            }
            HeadingEvent::Heading { level, label } => {
                self.flush();

                if self.is_terminal(&label) {
                    self.finished = true;
                    return false;
                }

                let level = level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL);
                let slot = usize::from(level - MIN_HEADING_LEVEL);
                self.breadcrumb[slot] = Some(label.trim().to_string());
                for deeper in &mut self.breadcrumb[slot + 1..] {
                    *deeper = None;
                }
            }
        }

        true
    }

    /// Current breadcrumb path, falling back to the document title
    pub fn breadcrumb_path(&self) -> String {
        let segments: Vec<&str> = self
            .breadcrumb
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|label| !label.is_empty())
            .collect();

        if segments.is_empty() {
            self.title.clone()
        } else {
            segments.join(BREADCRUMB_SEPARATOR)
        }
    }

    /// Ends the stream, flushing any trailing body text
    pub fn finish(mut self) -> Vec<OutlineRecord> {
        if !self.finished && !self.description.is_empty() {
            self.flush();
        }
        self.records
    }

    /// Emits the pending record and clears the description buffer
    ///
    /// A record with no heading in scope and no text is skipped: it would only
    /// repeat the document title.
    fn flush(&mut self) {
        let in_heading_scope = self.breadcrumb.iter().any(Option::is_some);
        if in_heading_scope || !self.description.is_empty() {
            let breadcrumb = self.breadcrumb_path();
            let body = std::mem::take(&mut self.description);
            self.records.push(OutlineRecord::new(breadcrumb, body));
        }
        self.description.clear();
    }

    fn is_terminal(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.terminal_markers.iter().any(|marker| label.contains(marker))
    }
}

/// Extracts outline records from a complete event stream
pub fn extract_outline(
    title: &str,
    events: impl IntoIterator<Item = HeadingEvent>,
    terminal_markers: &[String],
) -> Vec<OutlineRecord> {
    let mut extractor = OutlineExtractor::new(title, terminal_markers);
    for event in events {
        if !extractor.push(event) {
            break;
        }
    }
    extractor.finish()
}
