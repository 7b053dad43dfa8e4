use std::fs;

use chrono::Utc;
use curator_engine::{
    ContentMetadata, ExtractedContent, ProcessingStatus, ResourceType, StorageManager,
    PROCESSING_LOG_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_content(title: &str, url: &str) -> ExtractedContent {
    let content = "Some extracted body text.".to_string();
    ExtractedContent {
        title: title.to_string(),
        description: "A short description".to_string(),
        content: content.clone(),
        metadata: ContentMetadata {
            url: url.to_string(),
            domain: "example.com".to_string(),
            extracted_at: Utc::now(),
            extractor: "fallback".to_string(),
            word_count: content.split_whitespace().count(),
        },
    }
}

#[test]
fn documents_land_in_their_category_directory() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();

    let content = sample_content("My Repo", "https://github.com/acme/widgets");
    let path = storage
        .save(&content, ResourceType::GithubRepo, &content.metadata.url)
        .expect("save ok");

    assert!(path.starts_with(temp.path().join("github-repos")));
    assert_eq!(path.file_name().unwrap(), "my-repo.md");
    assert!(path.exists());
}

#[test]
fn colliding_titles_get_counter_suffixes_and_nothing_is_overwritten() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();

    let first = sample_content("Hello World!!!", "https://example.com/first");
    let second = sample_content("Hello World!!!", "https://example.com/second");

    let first_path = storage
        .save(&first, ResourceType::Article, &first.metadata.url)
        .unwrap();
    let second_path = storage
        .save(&second, ResourceType::Article, &second.metadata.url)
        .unwrap();

    assert_eq!(first_path.file_name().unwrap(), "hello-world.md");
    assert_eq!(second_path.file_name().unwrap(), "hello-world-2.md");
    assert!(first_path.exists());
    assert!(second_path.exists());

    let first_doc = fs::read_to_string(&first_path).unwrap();
    let second_doc = fs::read_to_string(&second_path).unwrap();
    assert!(first_doc.contains("https://example.com/first"));
    assert!(second_doc.contains("https://example.com/second"));
}

#[test]
fn document_format_contains_header_body_and_footer() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();

    let content = sample_content("A Fine Article", "https://example.com/fine");
    let path = storage
        .save(&content, ResourceType::Article, &content.metadata.url)
        .unwrap();
    let document = fs::read_to_string(path).unwrap();

    assert!(document.starts_with("---\n"));
    assert!(document.contains("title: \"A Fine Article\""));
    assert!(document.contains("source: https://example.com/fine"));
    assert!(document.contains("type: article"));
    assert!(document.contains("domain: example.com"));
    assert!(document.contains("processing_status: completed"));
    assert!(document.contains("# A Fine Article"));
    assert!(document.contains("## Description\nA short description"));
    assert!(document.contains("## Content\n\nSome extracted body text."));
    assert!(document.contains("**Source:** [https://example.com/fine](https://example.com/fine)"));
    assert!(document.contains("**Extractor:** fallback"));
    assert!(document.contains("**Word Count:** 4"));
}

#[test]
fn failed_saves_return_none_and_are_recorded() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();
    // Occupy the category path with a file so the directory cannot exist.
    fs::write(temp.path().join("articles"), "in the way").unwrap();

    let content = sample_content("Doomed", "https://example.com/doomed");
    let result = storage.save(&content, ResourceType::Article, &content.metadata.url);

    assert_eq!(result, None);
    assert_eq!(storage.stats().failed, 1);
    assert_eq!(storage.stats().saved, 0);

    let log = storage.log();
    assert_eq!(log.total_processed, 1);
    assert_eq!(log.failed, 1);
    assert_eq!(log.resources[0].status, ProcessingStatus::Failed);
    assert!(log.resources[0].error.is_some());
}

#[test]
fn contained_failures_append_failed_entries() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();

    storage.record_failure("https://example.com/broken", "fetch failed: http status 404");

    let log = storage.log();
    assert_eq!(log.total_processed, 1);
    assert_eq!(log.successful, 0);
    assert_eq!(log.failed, 1);
    assert_eq!(log.resources[0].url, "https://example.com/broken");
    assert_eq!(log.resources[0].output_file, None);
}

#[test]
fn aggregates_are_recomputed_from_the_entry_sequence() {
    let temp = TempDir::new().unwrap();
    let mut storage = StorageManager::new(temp.path()).unwrap();

    let content = sample_content("Kept", "https://example.com/kept");
    storage.save(&content, ResourceType::Article, &content.metadata.url);
    storage.record_failure("https://example.com/lost", "boom");

    let log = storage.log();
    assert_eq!(log.total_processed, 2);
    assert_eq!(log.successful, 1);
    assert_eq!(log.failed, 1);
    assert_eq!(log.total_processed, log.resources.len());
}

#[test]
fn corrupt_processing_log_degrades_to_fresh() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(PROCESSING_LOG_FILENAME), "{not json").unwrap();

    let storage = StorageManager::new(temp.path()).unwrap();
    assert_eq!(storage.log().total_processed, 0);
    assert!(storage.log().resources.is_empty());
}

#[test]
fn history_accumulates_across_runs() {
    let temp = TempDir::new().unwrap();

    {
        let mut storage = StorageManager::new(temp.path()).unwrap();
        let content = sample_content("First Run", "https://example.com/one");
        storage.save(&content, ResourceType::Article, &content.metadata.url);
        storage.flush_log().unwrap();
    }

    let mut storage = StorageManager::new(temp.path()).unwrap();
    assert_eq!(storage.log().total_processed, 1);

    let content = sample_content("Second Run", "https://example.com/two");
    storage.save(&content, ResourceType::Article, &content.metadata.url);
    storage.flush_log().unwrap();

    let reloaded = StorageManager::new(temp.path()).unwrap();
    assert_eq!(reloaded.log().total_processed, 2);
    assert_eq!(reloaded.log().successful, 2);
    let urls: Vec<_> = reloaded
        .log()
        .resources
        .iter()
        .map(|entry| entry.url.as_str())
        .collect();
    assert_eq!(urls, vec!["https://example.com/one", "https://example.com/two"]);
}
