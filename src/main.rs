mod config;
mod error;
mod gallery;
mod image;
mod pages;
mod pipeline;
mod scene;
mod server;
mod translate;
mod tts;
mod video;

use anyhow::Result;
use config::Config;
use gallery::GalleryStore;
use image::{ImageFetcher, ImageSource};
use pipeline::StoryPipeline;
use server::AppState;
use std::sync::Arc;
use tokio::sync::Semaphore;
use translate::Translator;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Arc::new(Config::load()?);
    config.ensure_directories()?;

    let translator = Translator::new(config.pipeline.prompt_max_chars);
    let images: Arc<dyn ImageSource> =
        Arc::new(ImageFetcher::new(config.image.clone(), translator));
    let speech = tts::create_client(&config)?;
    let pipeline = Arc::new(StoryPipeline::new(
        config.clone(),
        images.clone(),
        speech.clone(),
    ));
    let gallery = Arc::new(GalleryStore::open(&config.gallery_file));
    let jobs = Arc::new(Semaphore::new(config.pipeline.max_jobs.max(1)));

    let state = AppState {
        config: config.clone(),
        pipeline,
        images,
        speech,
        gallery,
        jobs,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    log::info!("listening on http://{}", config.bind);
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
