//! End-to-end question answering over a document on disk.

use async_trait::async_trait;
use lese::config::{EmbeddingProvider, Prompts, Settings};
use lese::embedding::HashingEmbedder;
use lese::error::{LeseError, Result};
use lese::extract::DocumentSource;
use lese::rag::{AnswerGenerator, RagEngine};
use lese::retriever::Retriever;
use lese::session::Session;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies with a fixed answer and remembers the prompts it was given.
struct ScriptedGenerator {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, _system: &str, user: &str, _max_tokens: u32) -> Result<String> {
        self.prompts.lock().unwrap().push(user.to_string());
        Ok(format!("  {}\n", self.answer))
    }
}

/// Never answers in time.
struct StalledGenerator;

#[async_trait]
impl AnswerGenerator for StalledGenerator {
    async fn generate(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.provider = EmbeddingProvider::Hashing;
    settings.embedding.dimensions = 256;
    settings
}

fn write_manual(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("manual.txt");
    let pages = [
        "The warranty lasts two years from the date of purchase.",
        "Batteries must be recycled at a certified collection point.",
        "Clean the filter monthly with warm water and mild soap.",
    ];
    std::fs::write(&path, pages.join("\u{000C}")).unwrap();
    path
}

fn session_with(generator: Arc<dyn AnswerGenerator>) -> Session {
    Session::with_components(
        &settings(),
        Prompts::default(),
        Arc::new(HashingEmbedder::new(256)),
        generator,
    )
    .unwrap()
}

#[tokio::test]
async fn test_index_and_ask_with_citations() {
    let dir = tempfile::tempdir().unwrap();
    let document = DocumentSource::from_path(&write_manual(&dir)).unwrap();
    assert_eq!(document.name, "manual.txt");

    let generator = Arc::new(ScriptedGenerator::new("Two years."));
    let session = session_with(generator.clone());

    let chunks = session.index_document(document).await.unwrap();
    assert_eq!(chunks, 3);

    let response = session
        .ask_with_sources("How long does the warranty last?")
        .await
        .unwrap();
    assert_eq!(response.answer, "Two years.");
    assert_eq!(response.sources.len(), 3);
    assert_eq!(response.sources[0].citation(), "manual.txt, page 1");

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("[Source: manual.txt, page 1]\nThe warranty lasts two years"));
    assert!(prompt.contains("How long does the warranty last?"));

    let history = session.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].answer, "Two years.");
}

#[tokio::test]
async fn test_search_ranks_matching_page_first() {
    let dir = tempfile::tempdir().unwrap();
    let document = DocumentSource::from_path(&write_manual(&dir)).unwrap();

    let session = session_with(Arc::new(ScriptedGenerator::new("unused")));
    session.index_document(document).await.unwrap();

    let results = session.search("recycled batteries", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].passage.page, 2);
}

#[tokio::test]
async fn test_reindex_replaces_previous_document() {
    let session = session_with(Arc::new(ScriptedGenerator::new("ok")));

    session
        .index_document(DocumentSource::new("old.txt", b"old content about tractors".to_vec()))
        .await
        .unwrap();
    session
        .index_document(DocumentSource::new("new.txt", b"new content about boats".to_vec()))
        .await
        .unwrap();

    let results = session.search("tractors", 5).await.unwrap();
    assert!(results.iter().all(|r| r.passage.source == "new.txt"));

    let info = session.info().await;
    assert_eq!(info.document.unwrap().source, "new.txt");
}

#[tokio::test]
async fn test_document_without_text_cannot_be_searched() {
    let session = session_with(Arc::new(ScriptedGenerator::new("ok")));

    let chunks = session
        .index_document(DocumentSource::new("blank.txt", b"  \x0c \n ".to_vec()))
        .await
        .unwrap();
    assert_eq!(chunks, 0);

    let err = session.ask("anything there?").await.unwrap_err();
    assert!(matches!(err, LeseError::EmptyIndex));
}

#[tokio::test]
async fn test_stalled_generation_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let document = DocumentSource::from_path(&write_manual(&dir)).unwrap();

    let retriever =
        Arc::new(Retriever::from_settings(Arc::new(HashingEmbedder::new(256)), &settings()).unwrap());
    retriever.index_document(document).await.unwrap();

    let engine = RagEngine::new(retriever, Arc::new(StalledGenerator))
        .with_generation_timeout(Duration::from_millis(50));
    let err = engine.ask("How long is the warranty?").await.unwrap_err();

    assert!(matches!(err, LeseError::Timeout { operation: "generation", .. }));
    assert_eq!(err.kind(), "timeout");
}
