// SYNOID Rough Cut Server
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::agent::assignment::match_scenes_to_videos;
use crate::agent::production_tools::render_rough_cut;
use crate::agent::ranking::{Match, Preferences};
use crate::agent::script_segmenter::{segment, Scene};
use crate::agent::vision_tools::detect_emotion_from_bytes;
use crate::state::{AppState, RoughCutState};

pub const OUTPUT_FILE_NAME: &str = "final_cut.mp4";

/// JSON error body with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct ScriptRequest {
    #[serde(default)]
    pub script_text: String,
}

#[derive(Serialize)]
pub struct ScriptResponse {
    pub scenes: Vec<Scene>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub video_paths: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub video_url: String,
    pub confidence_score: u8,
    pub matches: Vec<Match>,
}

#[derive(Deserialize)]
pub struct EmotionRequest {
    #[serde(default)]
    pub image: String,
}

#[derive(Serialize)]
pub struct EmotionResponse {
    pub emotion: String,
}

pub fn router(state: AppState) -> Router {
    let output_dir = state.config.output_dir.clone();
    Router::new()
        .route("/api/script", post(handle_script))
        .route("/api/generate", post(handle_generate))
        .route("/api/detect_emotion", post(handle_detect_emotion))
        .nest_service("/output", ServeDir::new(output_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub async fn start_server(port: u16, state: Arc<RoughCutState>) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&state.config.output_dir).await?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("[SERVER] 🚀 SYNOID Rough Cut server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_script(Json(payload): Json<ScriptRequest>) -> Result<Json<ScriptResponse>, ApiError> {
    if payload.script_text.trim().is_empty() {
        return Err(ApiError::bad_request("No script text provided"));
    }
    Ok(Json(ScriptResponse {
        scenes: segment(&payload.script_text),
    }))
}

async fn handle_generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if payload.scenes.is_empty() || payload.video_paths.is_empty() {
        return Err(ApiError::bad_request("Missing scenes or videos"));
    }

    let prefs = payload.preferences;
    info!("[SERVER] Generating rough cut with {:?}", prefs);

    // Feature extraction shells out and blocks; keep it off the runtime.
    let ranking_state = state.clone();
    let scenes = payload.scenes;
    let clips = payload.video_paths;
    let result = tokio::task::spawn_blocking(move || {
        match_scenes_to_videos(
            &ranking_state.engine,
            &ranking_state.extractor,
            &scenes,
            &clips,
            &prefs,
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("Ranking task failed: {}", e)))?;

    let output = state.config.output_dir.join(OUTPUT_FILE_NAME);
    if let Err(e) = render_rough_cut(
        &state.config.ffmpeg,
        &state.config.ffprobe,
        &result.matches,
        &output,
    )
    .await
    {
        error!("[SERVER] Render failed: {:#}", e);
        return Err(ApiError::internal(format!("Failed to create video: {}", e)));
    }

    Ok(Json(GenerateResponse {
        video_url: format!("/output/{}", OUTPUT_FILE_NAME),
        confidence_score: result.confidence,
        matches: result.matches,
    }))
}

/// Strip an optional `data:...;base64,` prefix and decode.
pub fn decode_image_payload(raw: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let data = raw.split_once("base64,").map(|(_, d)| d).unwrap_or(raw);
    base64::engine::general_purpose::STANDARD.decode(data.trim())
}

async fn handle_detect_emotion(Json(payload): Json<EmotionRequest>) -> Result<Json<EmotionResponse>, ApiError> {
    if payload.image.is_empty() {
        return Err(ApiError::bad_request("No image data"));
    }
    let bytes = decode_image_payload(&payload.image)
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 image: {}", e)))?;

    let emotion = tokio::task::spawn_blocking(move || detect_emotion_from_bytes(&bytes))
        .await
        .map_err(|e| ApiError::internal(format!("Emotion task failed: {}", e)))?;

    Ok(Json(EmotionResponse {
        emotion: emotion.to_string(),
    }))
}
