//! HTTP API server for uploading documents and asking questions about them.
//!
//! Each upload belongs to a session; sessions are independent and live in the
//! server's [`SessionStore`] until the process exits.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::LeseError;
use crate::extract::DocumentSource;
use crate::retriever::IndexedDocument;
use crate::session::{HistoryEntry, Session, SessionStore};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    sessions: SessionStore,
    upload_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let max_upload_bytes = settings.server.max_upload_bytes;

    let upload_dir = settings.upload_dir();
    std::fs::create_dir_all(&upload_dir)?;

    let state = Arc::new(AppState {
        sessions: SessionStore::from_settings(&settings)?,
        upload_dir,
    });
    let app = router(state, max_upload_bytes);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Lese API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Upload", "POST   /upload (multipart: file, session_id)");
    Output::kv("Ask", "POST   /ask");
    Output::kv("History", "GET    /sessions/:session_id/history");
    Output::kv("Clear History", "DELETE /sessions/:session_id/history");
    Output::kv("End Session", "DELETE /sessions/:session_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .route("/sessions/{session_id}", delete(remove_session))
        .route("/sessions/{session_id}/history", get(history).delete(clear_history))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    session_id: Uuid,
    document: Option<IndexedDocument>,
    chunks_indexed: usize,
}

#[derive(Deserialize)]
struct AskRequest {
    session_id: Uuid,
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    source: String,
    page: u32,
    text: String,
}

#[derive(Serialize)]
struct HistoryResponse {
    session_id: Uuid,
    history: Vec<HistoryEntry>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

fn error_response(status: StatusCode, error: impl Into<String>, kind: &'static str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            kind,
        }),
    )
        .into_response()
}

impl IntoResponse for LeseError {
    fn into_response(self) -> Response {
        error_response(status_for(&self), self.to_string(), self.kind())
    }
}

/// HTTP status for each error kind.
fn status_for(error: &LeseError) -> StatusCode {
    match error {
        LeseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LeseError::NotIndexed => StatusCode::CONFLICT,
        LeseError::Extraction(_) | LeseError::EmptyIndex => StatusCode::UNPROCESSABLE_ENTITY,
        LeseError::Embedding(_) | LeseError::Generation(_) | LeseError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        LeseError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        LeseError::DimensionMismatch { .. }
        | LeseError::Config(_)
        | LeseError::Io(_)
        | LeseError::Json(_)
        | LeseError::TomlParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejected(status: StatusCode, body: String) -> Response {
    error_response(status, body, "invalid_input")
}

fn session_not_found(id: &Uuid) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session not found: {}", id),
        "not_found",
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    session_id: Option<String>,
    file: Option<DocumentSource>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(rejected(e.status(), e.body_text())),
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("session_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                if !text.trim().is_empty() {
                    form.session_id = Some(text.trim().to_string());
                }
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .and_then(|n| std::path::Path::new(n).file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                if !name.is_empty() {
                    form.file = Some(DocumentSource::new(name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let Some(document) = form.file else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded", "invalid_input");
    };

    let (session, created) = match resolve_session(&state, form.session_id.as_deref()).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    info!("Upload of {} into session {}", document.name, session.id());
    let name = document.name.clone();
    let bytes = document.bytes.clone();

    match session.index_document(document).await {
        Ok(chunks_indexed) => {
            if let Err(e) = save_upload(&state.upload_dir, session.id(), &name, &bytes).await {
                warn!("Failed to keep a copy of {}: {}", name, e);
            }

            Json(UploadResponse {
                session_id: session.id(),
                document: session.engine().retriever().indexed_document().await,
                chunks_indexed,
            })
            .into_response()
        }
        Err(e) => {
            // The caller never learns the id of a session created for a failed upload.
            if created {
                state.sessions.remove(&session.id()).await;
            }
            e.into_response()
        }
    }
}

/// Find the named session, or start a new one when none is named.
///
/// The flag is true when the session was created for this request.
async fn resolve_session(
    state: &AppState,
    session_id: Option<&str>,
) -> Result<(Arc<Session>, bool), Response> {
    match session_id {
        Some(raw) => {
            let id = Uuid::parse_str(raw).map_err(|_| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid session id: {}", raw),
                    "invalid_input",
                )
            })?;
            let session = state
                .sessions
                .get(&id)
                .await
                .ok_or_else(|| session_not_found(&id))?;
            Ok((session, false))
        }
        None => {
            let session = state.sessions.create().await.map_err(|e| e.into_response())?;
            Ok((session, true))
        }
    }
}

/// Keep the uploaded bytes under the upload directory, one folder per session.
async fn save_upload(
    upload_dir: &std::path::Path,
    session_id: Uuid,
    name: &str,
    bytes: &[u8],
) -> std::io::Result<()> {
    let dir = upload_dir.join(session_id.to_string());
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(name), bytes).await
}

async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };

    let Some(session) = state.sessions.get(&req.session_id).await else {
        return session_not_found(&req.session_id);
    };

    match session.ask_with_sources(&req.question).await {
        Ok(response) => Json(AskResponse {
            answer: response.answer,
            sources: response
                .sources
                .into_iter()
                .map(|p| SourceInfo {
                    source: p.source,
                    page: p.page,
                    text: p.text,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn history(
    State(state): State<Arc<AppState>>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(session_id) = match session_id {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };

    match state.sessions.get(&session_id).await {
        Some(session) => Json(HistoryResponse {
            session_id,
            history: session.history().await,
        })
        .into_response(),
        None => session_not_found(&session_id),
    }
}

async fn clear_history(
    State(state): State<Arc<AppState>>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(session_id) = match session_id {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };

    match state.sessions.get(&session_id).await {
        Some(session) => {
            session.clear_history().await;
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(&session_id),
    }
}

async fn remove_session(
    State(state): State<Arc<AppState>>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(session_id) = match session_id {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };

    if state.sessions.remove(&session_id).await {
        info!("Removed session {}", session_id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingProvider, Prompts};
    use crate::embedding::HashingEmbedder;
    use crate::error::Result;
    use crate::rag::AnswerGenerator;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "lese-test-boundary";

    struct EchoGenerator;

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
            Ok("From the document.".to_string())
        }
    }

    fn test_state(upload_dir: &std::path::Path) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        settings.embedding.dimensions = 32;

        Arc::new(AppState {
            sessions: SessionStore::with_components(
                settings,
                Prompts::default(),
                Arc::new(HashingEmbedder::new(32)),
                Arc::new(EchoGenerator),
            ),
            upload_dir: upload_dir.to_path_buf(),
        })
    }

    /// Multipart body with an optional session id and an optional file part.
    fn upload_request(session_id: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(id) = session_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{id}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_upload_ask_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()), 1024 * 1024);

        let (status, body) = send(
            &app,
            upload_request(None, Some(("manual.txt", b"The warranty lasts two years."))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chunks_indexed"], 1);
        assert_eq!(body["document"]["source"], "manual.txt");
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert!(dir.path().join(&session_id).join("manual.txt").exists());

        let ask = format!(r#"{{"session_id": "{session_id}", "question": "How long is the warranty?"}}"#);
        let (status, body) = send(&app, json_request("POST", "/ask", &ask)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "From the document.");
        assert_eq!(body["sources"][0]["page"], 1);

        let history_uri = format!("/sessions/{session_id}/history");
        let (status, body) = send(&app, empty_request("GET", &history_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
        assert_eq!(body["history"][0]["question"], "How long is the warranty?");

        let (status, _) = send(&app, empty_request("DELETE", &history_uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, empty_request("GET", &history_uri)).await;
        assert!(body["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone(), 1024 * 1024);

        let (status, body) = send(&app, upload_request(None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let (status, body) = send(&app, upload_request(None, Some(("", b"text")))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_into_unknown_or_malformed_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()), 1024 * 1024);
        let file = Some(("a.txt", b"some text".as_slice()));

        let unknown = Uuid::new_v4().to_string();
        let (status, body) = send(&app, upload_request(Some(&unknown), file)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = send(&app, upload_request(Some("not-a-uuid"), file)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_failed_first_upload_leaves_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone(), 1024 * 1024);

        let (status, body) = send(&app, upload_request(None, Some(("bad.txt", &[0xff, 0xfe])))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "extraction");
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_existing_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone(), 1024 * 1024);
        let session = state.sessions.create().await.unwrap();

        let id = session.id().to_string();
        let (status, _) = send(&app, upload_request(Some(&id), Some(("bad.txt", &[0xff])))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.sessions.get(&session.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_ask_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone(), 1024 * 1024);

        let unknown = format!(r#"{{"session_id": "{}", "question": "Hi?"}}"#, Uuid::new_v4());
        let (status, body) = send(&app, json_request("POST", "/ask", &unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let session = state.sessions.create().await.unwrap();
        let not_indexed = format!(r#"{{"session_id": "{}", "question": "Hi?"}}"#, session.id());
        let (status, body) = send(&app, json_request("POST", "/ask", &not_indexed)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "not_indexed");

        let blank = format!(r#"{{"session_id": "{}", "question": "   "}}"#, session.id());
        let (status, body) = send(&app, json_request("POST", "/ask", &blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let (status, body) = send(&app, json_request("POST", "/ask", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let bad_id = r#"{"session_id": "nope", "question": "Hi?"}"#;
        let (status, body) = send(&app, json_request("POST", "/ask", bad_id)).await;
        assert!(status.is_client_error());
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_remove_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = router(state.clone(), 1024 * 1024);
        let session = state.sessions.create().await.unwrap();

        let uri = format!("/sessions/{}", session.id());
        let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty().await);

        let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = send(&app, empty_request("GET", "/sessions/nope/history")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[test]
    fn test_status_for_error_kinds() {
        assert_eq!(
            status_for(&LeseError::InvalidInput("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&LeseError::NotIndexed), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&LeseError::Generation("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&LeseError::Timeout {
                operation: "generation",
                limit: std::time::Duration::from_secs(5)
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&LeseError::DimensionMismatch {
                expected: 3,
                actual: 2
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_carries_kind() {
        let response = LeseError::NotIndexed.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
