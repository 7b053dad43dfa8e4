use std::fs;
use std::path::{Path, PathBuf};

use curator_engine::{
    ExtractorRegistry, FallbackExtractor, FetchSettings, ManifestError, Pipeline, ProcessingLog,
    ProcessingStatus, ResourceType, StorageManager, PROCESSING_LOG_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head>
        <body><main><p>{body}</p></main></body></html>"#
    )
}

async fn start_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alpha"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page("Alpha", "Alpha content"), "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/omega"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page("Omega", "Omega content"), "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    server
}

fn write_manifest(dir: &Path, server_uri: &str) -> PathBuf {
    let manifest = format!(
        r#"[
            {{"url": "{server_uri}/alpha"}},
            {{"url": "{server_uri}/broken"}},
            {{"url": "{server_uri}/alpha"}},
            {{"url": "not-a-url"}},
            {{"url": "{server_uri}/omega"}}
        ]"#
    );
    let manifest_path = dir.join("resources.json");
    fs::write(&manifest_path, manifest).unwrap();
    manifest_path
}

fn build_pipeline(output_dir: &Path) -> Pipeline {
    let storage = StorageManager::new(output_dir).unwrap();
    let registry = ExtractorRegistry::new(Box::new(FallbackExtractor::new(
        FetchSettings::default(),
    )));
    Pipeline::new(registry, storage)
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    curator_logging::initialize_for_tests();

    let server = start_server().await;
    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("knowledge");
    let manifest_path = write_manifest(temp.path(), &server.uri());

    let mut pipeline = build_pipeline(&output_dir);
    let stats = pipeline.run(&manifest_path).await.unwrap();

    // Duplicate and invalid entries are dropped before processing.
    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 1);

    let load_stats = pipeline.load_stats();
    assert_eq!(load_stats.invalid, 1);
    assert_eq!(load_stats.duplicates, 1);

    // The resource after the failing one was still processed.
    let articles = output_dir.join("articles");
    assert!(articles.join("alpha.md").exists());
    assert!(articles.join("omega.md").exists());

    let log: ProcessingLog =
        serde_json::from_str(&fs::read_to_string(output_dir.join(PROCESSING_LOG_FILENAME)).unwrap())
            .unwrap();
    assert_eq!(log.total_processed, 3);
    assert_eq!(log.successful, 2);
    assert_eq!(log.failed, 1);

    let failed: Vec<_> = log
        .resources
        .iter()
        .filter(|entry| entry.status == ProcessingStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].url.ends_with("/broken"));
    assert!(failed[0].error.as_deref().unwrap().contains("500"));
}

#[tokio::test]
async fn reruns_extend_the_processing_log() {
    let server = start_server().await;
    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("knowledge");
    let manifest_path = write_manifest(temp.path(), &server.uri());

    let mut first = build_pipeline(&output_dir);
    first.run(&manifest_path).await.unwrap();

    let mut second = build_pipeline(&output_dir);
    let stats = second.run(&manifest_path).await.unwrap();
    assert_eq!(stats.successful, 2);

    let log: ProcessingLog =
        serde_json::from_str(&fs::read_to_string(output_dir.join(PROCESSING_LOG_FILENAME)).unwrap())
            .unwrap();
    assert_eq!(log.total_processed, 6);
    assert_eq!(log.successful, 4);
    assert_eq!(log.failed, 2);

    // Same titles on the second run allocate suffixed filenames instead of
    // overwriting the first run's documents.
    let articles = output_dir.join("articles");
    assert!(articles.join("alpha.md").exists());
    assert!(articles.join("alpha-2.md").exists());
    assert!(articles.join("omega.md").exists());
    assert!(articles.join("omega-2.md").exists());
}

#[tokio::test]
async fn per_category_detection_counts_are_reported() {
    let server = start_server().await;
    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("knowledge");
    let manifest_path = write_manifest(temp.path(), &server.uri());

    let mut pipeline = build_pipeline(&output_dir);
    pipeline.run(&manifest_path).await.unwrap();

    let detection = pipeline.classifier().stats();
    assert_eq!(detection[&ResourceType::Article], 3);
    assert_eq!(detection[&ResourceType::GithubRepo], 0);

    assert_eq!(pipeline.storage().stats().saved, 2);
    assert!(pipeline.storage().stats().total_bytes > 0);
}

#[tokio::test]
async fn missing_manifest_aborts_the_run() {
    let temp = TempDir::new().unwrap();
    let mut pipeline = build_pipeline(&temp.path().join("knowledge"));

    let err = pipeline
        .run(&temp.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ManifestError::NotFound(_)));
}
