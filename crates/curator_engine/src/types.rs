use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Closed set of resource categories a URL can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    GithubRepo,
    YoutubeVideo,
    BlogPost,
    Article,
    Unknown,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::GithubRepo,
        ResourceType::YoutubeVideo,
        ResourceType::BlogPost,
        ResourceType::Article,
        ResourceType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::GithubRepo => "github-repo",
            ResourceType::YoutubeVideo => "youtube-video",
            ResourceType::BlogPost => "blog-post",
            ResourceType::Article => "article",
            ResourceType::Unknown => "unknown",
        }
    }

    /// Storage directory used for documents of this type.
    pub fn category(self) -> &'static str {
        match self {
            ResourceType::GithubRepo => "github-repos",
            ResourceType::YoutubeVideo => "youtube-videos",
            ResourceType::BlogPost => "blog-posts",
            ResourceType::Article => "articles",
            ResourceType::Unknown => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific metadata attached to a classification.
///
/// `domain` is populated for every type; the remaining fields only for the
/// types that define them (owner/repo/full_name for repositories, video_id
/// for videos).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMetadata {
    pub domain: String,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub full_name: Option<String>,
    pub video_id: Option<String>,
}

/// Structured content produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    pub content: String,
    pub metadata: ContentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMetadata {
    pub url: String,
    pub domain: String,
    pub extracted_at: DateTime<Utc>,
    pub extractor: String,
    pub word_count: usize,
}

/// Failure while fetching a resource over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchFailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FetchFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode { encoding: String },
    Network,
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailureKind::InvalidUrl => write!(f, "invalid url"),
            FetchFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FetchFailureKind::Timeout => write!(f, "timeout"),
            FetchFailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FetchFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FetchFailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FetchFailureKind::Decode { encoding } => {
                write!(f, "failed to decode body as {encoding}")
            }
            FetchFailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failure while extracting content from a resource.
///
/// Fatal to the affected resource only; the orchestrator contains it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extracted {field} is empty")]
    EmptyField { field: &'static str },
}

/// Per-execution counters. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    pub fn start() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Elapsed time of the run; measured against now while still running.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}
