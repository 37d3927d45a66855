use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Wiki-Outline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
}

/// Frontier discipline used by the crawl orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Recursive exploration, each subtree finished before its siblings
    DepthFirst,
    /// FIFO frontier with an optional level cap
    BreadthFirst,
}

impl Traversal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthFirst => "depth-first",
            Self::BreadthFirst => "breadth-first",
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_traversal")]
    pub traversal: Traversal,

    /// Number of breadth-first levels whose neighbors are admitted to the frontier
    #[serde(rename = "max-levels", default)]
    pub max_levels: Option<u32>,

    /// Depth at which depth-first recursion unwinds
    #[serde(rename = "max-recursion-depth", default = "default_max_recursion_depth")]
    pub max_recursion_depth: u32,

    /// Fetch attempts per document before giving up on transient errors
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Growth factor applied to the previous delay on each further retry
    #[serde(rename = "backoff-multiplier", default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            traversal: default_traversal(),
            max_levels: None,
            max_recursion_depth: default_max_recursion_depth(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// The wiki being crawled and where the crawl starts
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path prefix under which article pages live
    #[serde(rename = "content-root", default = "default_content_root")]
    pub content_root: String,

    /// Seed titles or URLs
    #[serde(default = "default_seeds")]
    pub seeds: Vec<String>,

    /// Namespace prefixes that never name an article
    #[serde(rename = "reserved-namespaces", default = "default_reserved_namespaces")]
    pub reserved_namespaces: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            content_root: default_content_root(),
            seeds: default_seeds(),
            reserved_namespaces: default_reserved_namespaces(),
        }
    }
}

/// Keyword relevance gate
#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Number of distinct keywords a document must contain
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            threshold: default_threshold(),
        }
    }
}

/// Outline extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Heading labels after which a document's outline stops
    #[serde(rename = "terminal-sections", default = "default_terminal_sections")]
    pub terminal_sections: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            terminal_sections: default_terminal_sections(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for articles, logs, snapshots and the run summary
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl OutputConfig {
    pub fn articles_dir(&self) -> PathBuf {
        self.directory.join("articles")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.directory.join("log")
    }
}

/// Downstream topic prompt settings
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default = "default_system_prompt")]
    pub system: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            system: default_system_prompt(),
        }
    }
}

fn default_traversal() -> Traversal {
    Traversal::BreadthFirst
}

fn default_max_recursion_depth() -> u32 {
    64
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_base_url() -> String {
    "https://en.wikipedia.org".to_string()
}

fn default_content_root() -> String {
    "/wiki/".to_string()
}

fn default_seeds() -> Vec<String> {
    vec!["List of areas of law".to_string()]
}

fn default_reserved_namespaces() -> Vec<String> {
    [
        "File",
        "Category",
        "Template",
        "Talk",
        "Help",
        "User",
        "Special",
        "Wikipedia",
        "Portal",
        "Draft",
        "Module",
        "MediaWiki",
        "TimedText",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_keywords() -> Vec<String> {
    [
        "law",
        "legal",
        "statute",
        "legislative",
        "judicial",
        "legislation",
        "legislature",
        "government",
        "court",
        "due process",
        "jurisprudence",
        "jury",
        "tribunal",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_threshold() -> usize {
    2
}

fn default_terminal_sections() -> Vec<String> {
    vec!["References".to_string(), "Notes".to_string()]
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./scraped_wiki_article_data")
}

fn default_subject() -> String {
    "law".to_string()
}

fn default_system_prompt() -> String {
    "You are a law topic generator".to_string()
}
