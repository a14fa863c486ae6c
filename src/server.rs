//! HTTP front end: the upload form, the result page and generated PDFs.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | upload form (`?kind=std\|dispen` preselects a kind) |
//! | `POST /process` | multipart `kind` + `file`; runs the pipeline |
//! | `GET /documents/{kind}/{file}` | a generated letter PDF |
//! | `GET /health` | liveness probe |

use crate::config::LetterKind;
use crate::error::SuratError;
use crate::pipeline::convert::FormatConverter;
use crate::pipeline::llm::TextGenerator;
use crate::present::{render_form_page, render_result_page};
use crate::process::Pipeline;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct AppState<G, C> {
    pub pipeline: Arc<Pipeline<G, C>>,
    pub started_at: Instant,
}

impl<G, C> Clone for AppState<G, C> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            started_at: self.started_at,
        }
    }
}

pub fn build_router<G, C>(pipeline: Arc<Pipeline<G, C>>) -> Router
where
    G: TextGenerator + 'static,
    C: FormatConverter + 'static,
{
    let max_body_size = pipeline.config().max_upload_bytes;
    let state = AppState {
        pipeline,
        started_at: Instant::now(),
    };

    Router::new()
        .route("/", get(form_handler))
        .route("/process", post(process_handler::<G, C>))
        .route("/documents/{kind}/{file}", get(document_handler::<G, C>))
        .route("/health", get(health_handler::<G, C>))
        // Multipart has its own 2 MiB default; the tower layer is the real cap.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve<G, C>(pipeline: Arc<Pipeline<G, C>>, addr: SocketAddr) -> std::io::Result<()>
where
    G: TextGenerator + 'static,
    C: FormatConverter + 'static,
{
    let router = build_router(pipeline);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

#[derive(Deserialize)]
struct FormQuery {
    kind: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

async fn form_handler(Query(query): Query<FormQuery>) -> Html<String> {
    let selected = query
        .kind
        .and_then(|k| k.parse().ok())
        .unwrap_or(LetterKind::Assignment);
    Html(render_form_page(&LetterKind::ALL, selected, None))
}

async fn process_handler<G, C>(
    State(state): State<AppState<G, C>>,
    mut multipart: Multipart,
) -> Response
where
    G: TextGenerator + 'static,
    C: FormatConverter + 'static,
{
    let mut kind_field: Option<String> = None;
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                return form_error(
                    e.status(),
                    LetterKind::Assignment,
                    &format!("Upload tidak dapat dibaca: {e}"),
                );
            }
        };
        match field.name() {
            Some("kind") => match field.text().await {
                Ok(text) => kind_field = Some(text),
                Err(e) => {
                    return form_error(
                        e.status(),
                        LetterKind::Assignment,
                        &format!("Upload tidak dapat dibaca: {e}"),
                    );
                }
            },
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, content_type, bytes.to_vec())),
                    Err(e) => {
                        return form_error(
                            e.status(),
                            LetterKind::Assignment,
                            &format!("Upload tidak dapat dibaca: {e}"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let kind = match kind_field.as_deref().map(str::parse::<LetterKind>) {
        Some(Ok(kind)) => kind,
        Some(Err(e)) => {
            return form_error(StatusCode::BAD_REQUEST, LetterKind::Assignment, &e.to_string())
        }
        None => {
            return form_error(
                StatusCode::BAD_REQUEST,
                LetterKind::Assignment,
                "Pilih jenis pengajuan terlebih dahulu.",
            )
        }
    };
    let Some((file_name, content_type, bytes)) = upload.filter(|(_, _, b)| !b.is_empty()) else {
        return form_error(StatusCode::BAD_REQUEST, kind, "Upload dokumen (PDF) terlebih dahulu.");
    };

    let pipeline = &state.pipeline;
    let submission = match pipeline
        .process(kind, &file_name, content_type.as_deref(), &bytes)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            warn!("Submission failed: {}", e);
            return form_error(status_for(&e), kind, &user_message(&e));
        }
    };

    Html(render_result_page(&submission, &submission.pdf_bytes)).into_response()
}

async fn document_handler<G, C>(
    State(state): State<AppState<G, C>>,
    Path((kind, file)): Path<(String, String)>,
) -> Response
where
    G: TextGenerator + 'static,
    C: FormatConverter + 'static,
{
    let Ok(kind) = kind.parse::<LetterKind>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !is_plain_pdf_name(&file) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state
        .pipeline
        .config()
        .output_root
        .join(kind.letter_folder())
        .join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{file}\""),
                ),
            ],
            Body::from(bytes),
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn health_handler<G, C>(State(state): State<AppState<G, C>>) -> impl IntoResponse
where
    G: TextGenerator + 'static,
    C: FormatConverter + 'static,
{
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

fn form_error(status: StatusCode, kind: LetterKind, message: &str) -> Response {
    (status, Html(render_form_page(&LetterKind::ALL, kind, Some(message)))).into_response()
}

/// 400 for a rejected upload, 422 for a PDF we cannot read, 500 otherwise.
fn status_for(err: &SuratError) -> StatusCode {
    match err {
        SuratError::UnsupportedUpload { .. } => StatusCode::BAD_REQUEST,
        e if e.is_user_error() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn user_message(err: &SuratError) -> String {
    if err.is_user_error() {
        err.to_string()
    } else {
        format!("Terjadi kesalahan: {err}")
    }
}

/// A single file name ending in `.pdf`, with no path components and nothing
/// that needs quoting in a header.
fn is_plain_pdf_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '"'])
        && !name.chars().any(char::is_control)
        && !name.starts_with('.')
        && name.to_ascii_lowercase().ends_with(".pdf")
}
