//! Thin HTTP surface over the newscast pipeline.
//!
//! One endpoint, `POST /generate`, accepts `{"urls": [...]}` and answers
//! with the artifact path and the per-story summaries. Any pipeline failure
//! is reported as HTTP 500 with the error message; there is no
//! authentication or rate limiting.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::assembler::AudioAssembler;
use crate::extractor::ContentExtractor;
use crate::newscast::NewscastGenerator;
use crate::summarizer::Summarizer;
use crate::synthesizer::SpeechSynthesizer;

/// Request body for `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub urls: Vec<String>,
}

/// Response body for `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub audio_file: String,
    pub summaries: Vec<String>,
}

/// Shared state: one generator serves every request.
pub struct AppState<E, S, T, A> {
    pub generator: Arc<NewscastGenerator<E, S, T, A>>,
}

impl<E, S, T, A> Clone for AppState<E, S, T, A> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
        }
    }
}

pub fn create_router<E, S, T, A>(state: AppState<E, S, T, A>) -> Router
where
    E: ContentExtractor + 'static,
    S: Summarizer + 'static,
    T: SpeechSynthesizer + 'static,
    A: AudioAssembler + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate", post(generate_handler::<E, S, T, A>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run<E, S, T, A>(addr: &str, state: AppState<E, S, T, A>) -> std::io::Result<()>
where
    E: ContentExtractor + 'static,
    S: Summarizer + 'static,
    T: SpeechSynthesizer + 'static,
    A: AudioAssembler + 'static,
{
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Newscast API listening");
    axum::serve(listener, app).await
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn generate_handler<E, S, T, A>(
    State(state): State<AppState<E, S, T, A>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)>
where
    E: ContentExtractor + 'static,
    S: Summarizer + 'static,
    T: SpeechSynthesizer + 'static,
    A: AudioAssembler + 'static,
{
    let artifact = state
        .generator
        .generate(&request.urls)
        .await
        .map_err(|e| {
            error!(error = %e, "Newscast generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(GenerateResponse {
        audio_file: artifact.path.display().to_string(),
        summaries: artifact.summaries,
    }))
}
