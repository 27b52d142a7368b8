//! Question-answering sessions.
//!
//! A [`Session`] is the unit a front-end talks to: one active document, one
//! engine, and the questions asked so far. Sessions share nothing with each
//! other; the HTTP server keeps them in a [`SessionStore`].

use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::extract::DocumentSource;
use crate::index::SearchResult;
use crate::rag::{create_generator, AnswerGenerator, RagEngine, RagResponse};
use crate::retriever::{IndexedDocument, Retriever};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// A question and the answer it received.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Snapshot of a session's state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub document: Option<IndexedDocument>,
    pub questions_asked: usize,
}

/// One caller's document, engine and history.
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    engine: RagEngine,
    history: RwLock<Vec<HistoryEntry>>,
}

impl Session {
    /// Create a session around an engine.
    pub fn new(engine: RagEngine) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            engine,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Create a session with providers selected by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let embedder = create_embedder(&settings.embedding)?;
        let generator = create_generator(&settings.generation)?;

        Self::with_components(settings, prompts, embedder, generator)
    }

    /// Create a session from already-constructed providers.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Result<Self> {
        let retriever = Arc::new(Retriever::from_settings(embedder, settings)?);
        let engine = RagEngine::from_settings(retriever, generator, settings, prompts);
        Ok(Self::new(engine))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &RagEngine {
        &self.engine
    }

    /// Index a document, replacing any previous one. Returns the passage count.
    pub async fn index_document(&self, document: DocumentSource) -> Result<usize> {
        let count = self.engine.retriever().index_document(document).await?;
        info!("Session {} indexed {} passages", self.id, count);
        Ok(count)
    }

    /// Ask a question and return the answer text.
    pub async fn ask(&self, question: &str) -> Result<String> {
        Ok(self.ask_with_sources(question).await?.answer)
    }

    /// Ask a question and return the answer with its source passages.
    pub async fn ask_with_sources(&self, question: &str) -> Result<RagResponse> {
        let response = self.engine.ask(question).await?;

        self.history.write().await.push(HistoryEntry {
            question: question.trim().to_string(),
            answer: response.answer.clone(),
            asked_at: Utc::now(),
        });

        Ok(response)
    }

    /// Retrieve passages with distances, without generating an answer.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.engine.retriever().search(query, top_k).await
    }

    /// Questions asked so far, oldest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.clone()
    }

    /// Forget all questions asked so far.
    pub async fn clear_history(&self) {
        self.history.write().await.clear();
        debug!("Cleared history for session {}", self.id);
    }

    /// Snapshot of the session's state.
    pub async fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            created_at: self.created_at,
            document: self.engine.retriever().indexed_document().await,
            questions_asked: self.history.read().await.len(),
        }
    }
}

/// Independent sessions keyed by id.
pub struct SessionStore {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
    /// Create a store whose sessions use the providers selected by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let embedder = create_embedder(&settings.embedding)?;
        let generator = create_generator(&settings.generation)?;

        Ok(Self::with_components(settings.clone(), prompts, embedder, generator))
    }

    /// Create a store from already-constructed providers.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            settings,
            prompts,
            embedder,
            generator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new, empty session.
    pub async fn create(&self) -> Result<Arc<Session>> {
        let session = Arc::new(Session::with_components(
            &self.settings,
            self.prompts.clone(),
            self.embedder.clone(),
            self.generator.clone(),
        )?);

        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        info!("Created session {}", session.id());

        Ok(session)
    }

    /// Look up a session.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
