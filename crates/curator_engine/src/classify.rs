use std::collections::BTreeMap;

use curator_logging::curator_debug;
use url::Url;

use crate::types::{ResourceType, TypeMetadata};

const BLOG_INDICATORS: &[&str] = &[
    "medium.com",
    "dev.to",
    "substack.com",
    "hashnode",
    "blog.",
    "blogs.",
    "/blog/",
    "/post/",
    "/article/",
];

/// Classifies URLs into resource categories.
///
/// Classification is total: every URL maps to exactly one category, and a
/// URL that cannot even be parsed degrades to the article default. The only
/// state is a per-category occurrence counter.
#[derive(Debug)]
pub struct TypeClassifier {
    counts: BTreeMap<ResourceType, u64>,
}

impl TypeClassifier {
    pub fn new() -> Self {
        let counts = ResourceType::ALL.iter().map(|ty| (*ty, 0)).collect();
        Self { counts }
    }

    /// Classify a URL. First match wins; the order matters because the
    /// category patterns are not mutually exclusive.
    pub fn classify(&mut self, url: &str) -> (ResourceType, TypeMetadata) {
        let url = url.trim();

        let (resource_type, metadata) = match Url::parse(url) {
            Ok(parsed) => {
                let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
                let path = parsed.path().to_ascii_lowercase();

                if is_github_repo(&host, &path) {
                    (ResourceType::GithubRepo, github_metadata(&parsed))
                } else if is_youtube_video(&host, &path) {
                    (ResourceType::YoutubeVideo, youtube_metadata(&parsed, &host))
                } else if is_blog_post(&host, &path) {
                    (ResourceType::BlogPost, domain_metadata(host))
                } else {
                    (ResourceType::Article, domain_metadata(host))
                }
            }
            // urls reaching this point failed even scheme/host parsing;
            // classification stays total and falls back to the default.
            Err(_) => (ResourceType::Article, domain_metadata(String::new())),
        };

        *self.counts.entry(resource_type).or_insert(0) += 1;
        curator_debug!("Detected type '{resource_type}' for: {url}");

        (resource_type, metadata)
    }

    /// Snapshot of per-category occurrence counts.
    pub fn stats(&self) -> BTreeMap<ResourceType, u64> {
        self.counts.clone()
    }
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_github_repo(host: &str, path: &str) -> bool {
    host.contains("github.com") && path_segments(path).len() >= 2
}

fn is_youtube_video(host: &str, path: &str) -> bool {
    (host.contains("youtube.com") && path.contains("/watch")) || host.contains("youtu.be")
}

fn is_blog_post(host: &str, path: &str) -> bool {
    BLOG_INDICATORS
        .iter()
        .any(|indicator| host.contains(indicator) || path.contains(indicator))
}

fn domain_metadata(domain: String) -> TypeMetadata {
    TypeMetadata {
        domain,
        ..TypeMetadata::default()
    }
}

fn github_metadata(parsed: &Url) -> TypeMetadata {
    let segments = path_segments(parsed.path());
    let mut metadata = domain_metadata("github.com".to_string());

    if let [owner, repo, ..] = segments.as_slice() {
        metadata.owner = Some((*owner).to_string());
        metadata.repo = Some((*repo).to_string());
        metadata.full_name = Some(format!("{owner}/{repo}"));
    }

    metadata
}

fn youtube_metadata(parsed: &Url, host: &str) -> TypeMetadata {
    let mut metadata = domain_metadata("youtube.com".to_string());

    if host.contains("youtube.com") {
        metadata.video_id = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
    } else if host.contains("youtu.be") {
        metadata.video_id = path_segments(parsed.path()).first().map(|s| (*s).to_string());
    }

    metadata
}
