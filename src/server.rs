use crate::config::Config;
use crate::gallery::{EntryKind, GalleryEntry, GalleryStore};
use crate::image::ImageSource;
use crate::pages;
use crate::pipeline::{hex_token, GenerationRequest, StoryPipeline};
use crate::tts::SpeechClient;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<StoryPipeline>,
    pub images: Arc<dyn ImageSource>,
    pub speech: Arc<dyn SpeechClient>,
    pub gallery: Arc<GalleryStore>,
    /// Generation is resource-heavy; this caps how many run at once.
    pub jobs: Arc<Semaphore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/video-creator", get(video_creator))
        .route("/image-creator", get(image_creator))
        .route("/pricing", get(pricing))
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/gallery/photos", get(gallery_photos))
        .route("/gallery/videos", get(gallery_videos))
        .route("/generate-video", post(generate_video))
        .route("/generate-image", post(generate_image))
        .route("/publish", post(publish))
        .route("/voices", get(voices))
        .route("/download/:filename", get(download))
        .route("/static/*path", get(static_media))
        .with_state(state)
}

async fn home() -> Html<String> {
    Html(pages::home())
}

async fn video_creator() -> Html<String> {
    Html(pages::video_creator())
}

async fn image_creator() -> Html<String> {
    Html(pages::image_creator())
}

async fn pricing() -> Html<String> {
    Html(pages::pricing())
}

async fn about() -> Html<String> {
    Html(pages::about())
}

async fn contact() -> Html<String> {
    Html(pages::contact())
}

async fn gallery_photos(State(state): State<AppState>) -> Html<String> {
    let entries = state.gallery.list(EntryKind::Photo).await;
    Html(pages::gallery("Photo Gallery", &entries))
}

async fn gallery_videos(State(state): State<AppState>) -> Html<String> {
    let entries = state.gallery.list(EntryKind::Video).await;
    Html(pages::gallery("Video Gallery", &entries))
}

#[derive(Debug, Deserialize, Default)]
struct GenerateVideoForm {
    prompt: Option<String>,
    voice: Option<String>,
}

async fn generate_video(
    State(state): State<AppState>,
    Form(form): Form<GenerateVideoForm>,
) -> Response {
    let prompt = form.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is empty");
    }
    let voice = form
        .voice
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| state.config.audio.default_voice.clone());

    let _permit = match state.jobs.acquire().await {
        Ok(permit) => permit,
        Err(_) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "server is shutting down"),
    };

    let request = GenerationRequest {
        story_text: prompt,
        voice_id: voice,
    };
    match state.pipeline.generate(&request).await {
        Ok(name) => Json(json!({ "video_url": format!("/static/videos/{}", name) })).into_response(),
        Err(e) if e.is_input_error() => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            log::error!("video generation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GenerateImageForm {
    prompt: Option<String>,
}

async fn generate_image(
    State(state): State<AppState>,
    Form(form): Form<GenerateImageForm>,
) -> Response {
    let prompt = form.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No prompt");
    }

    let name = format!("art_{}.png", hex_token(8));
    let dest = state.config.images_dir().join(&name);
    match state.images.fetch(&prompt, &dest).await {
        Ok(_) => Json(json!({ "image_url": format!("/static/images/{}", name) })).into_response(),
        Err(e) => {
            log::error!("image generation failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI Service unavailable, try again in 10s",
            )
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct PublishForm {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    file_url: Option<String>,
}

async fn publish(State(state): State<AppState>, Form(form): Form<PublishForm>) -> Response {
    let kind = match EntryKind::parse(form.kind.as_deref().unwrap_or_default()) {
        Some(kind) => kind,
        None => return error_response(StatusCode::BAD_REQUEST, "type must be photo or video"),
    };

    let entry = GalleryEntry {
        id: hex_token(8),
        kind,
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        tags: form.tags.unwrap_or_default(),
        file_url: form.file_url.unwrap_or_default(),
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
    };

    match state.gallery.append(entry).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            log::error!("publish failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "JSON database error")
        }
    }
}

async fn voices(State(state): State<AppState>) -> Response {
    match state.speech.list_voices().await {
        Ok(voices) => Json(voices).into_response(),
        Err(e) => {
            log::warn!("voice listing failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "voice list unavailable")
        }
    }
}

async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    if !is_safe_name(&filename) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    for dir in [state.config.videos_dir(), state.config.images_dir()] {
        let path = dir.join(&filename);
        if let Ok(bytes) = tokio::fs::read(&path).await {
            return (
                [
                    (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response();
        }
    }
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn static_media(State(state): State<AppState>, Path(rest): Path<String>) -> Response {
    if !is_safe_path(&rest) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    let path = std::path::Path::new(&state.config.static_dir).join(&rest);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type_for(&rest).to_string())],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// A bare file name: no separators, no parent references, nothing hidden.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// A relative path whose every component is a safe name.
fn is_safe_path(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(is_safe_name)
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next().unwrap_or_default() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        _ => "application/octet-stream",
    }
}
