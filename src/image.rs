use crate::config::ImageConfig;
use crate::error::ImageFetchError;
use crate::translate::Translator;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Seam the pipeline fetches scene images through, so the partial-failure
/// fold is testable without a live endpoint.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches one image for `prompt` into `dest`. Returns the byte count
    /// written. One attempt per call; the caller decides whether to skip.
    async fn fetch(&self, prompt: &str, dest: &Path) -> Result<u64, ImageFetchError>;
}

pub struct ImageFetcher {
    client: reqwest::Client,
    translator: Translator,
    config: ImageConfig,
}

impl ImageFetcher {
    pub fn new(config: ImageConfig, translator: Translator) -> Self {
        Self {
            client: reqwest::Client::new(),
            translator,
            config,
        }
    }

    fn request_url(&self, prompt: &str, seed: u32) -> Result<Url, ImageFetchError> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|_| ImageFetchError::Endpoint(self.config.endpoint.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ImageFetchError::Endpoint(self.config.endpoint.clone()))?
            .push(prompt);
        url.query_pairs_mut()
            .append_pair("width", &self.config.width.to_string())
            .append_pair("height", &self.config.height.to_string())
            .append_pair("seed", &seed.to_string())
            .append_pair("nologo", "true")
            .append_pair("model", &self.config.model);
        Ok(url)
    }
}

#[async_trait]
impl ImageSource for ImageFetcher {
    async fn fetch(&self, prompt: &str, dest: &Path) -> Result<u64, ImageFetchError> {
        let translated = self.translator.translate(prompt).await;
        let styled = format!("{}{}", translated, self.config.style_suffix);

        let seed = rand::rng().random::<u32>();
        let url = self.request_url(&styled, seed)?;
        log::info!("requesting image: {}", clip_for_log(url.as_str(), 100));

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await?;
        validate_image_response(status, &content_type, body.len(), self.config.min_image_bytes)?;

        tokio::fs::write(dest, &body).await?;
        log::info!("image saved: {:?} ({} bytes)", dest, body.len());
        Ok(body.len() as u64)
    }
}

/// The integrity check: anything that is not an HTTP 200 image payload of
/// plausible size is treated as a disguised error page.
pub fn validate_image_response(
    status: StatusCode,
    content_type: &str,
    body_len: usize,
    min_bytes: usize,
) -> Result<(), ImageFetchError> {
    if status != StatusCode::OK {
        return Err(ImageFetchError::Status(status));
    }
    if !content_type.contains("image") {
        return Err(ImageFetchError::BadContentType(content_type.to_string()));
    }
    if body_len <= min_bytes {
        return Err(ImageFetchError::TooSmall(body_len));
    }
    Ok(())
}

fn clip_for_log(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::Translator;

    const MIN: usize = 10_000;

    #[test]
    fn test_validation_accepts_real_image() {
        let r = validate_image_response(StatusCode::OK, "image/png", 50_000, MIN);
        assert!(r.is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_status() {
        let r = validate_image_response(StatusCode::BAD_GATEWAY, "image/png", 50_000, MIN);
        assert!(matches!(r, Err(ImageFetchError::Status(s)) if s == StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_validation_rejects_non_image_content_type() {
        let r = validate_image_response(StatusCode::OK, "text/html; charset=utf-8", 50_000, MIN);
        assert!(matches!(r, Err(ImageFetchError::BadContentType(_))));
    }

    #[test]
    fn test_validation_rejects_small_bodies() {
        // Exactly the threshold is still too small.
        let r = validate_image_response(StatusCode::OK, "image/jpeg", MIN, MIN);
        assert!(matches!(r, Err(ImageFetchError::TooSmall(n)) if n == MIN));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ImageFetchError::Timeout.is_transient());
        assert!(ImageFetchError::Status(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(!ImageFetchError::Status(StatusCode::FORBIDDEN).is_transient());
        assert!(!ImageFetchError::TooSmall(12).is_transient());
        assert!(!ImageFetchError::BadContentType("text/html".into()).is_transient());
    }

    #[test]
    fn test_request_url_encodes_prompt() {
        let fetcher = ImageFetcher::new(
            crate::config::ImageConfig::default(),
            Translator::new(200),
        );
        let url = fetcher
            .request_url("a cat, cinematic & bright", 7)
            .unwrap();
        assert!(url.path().starts_with("/prompt/"));
        assert!(!url.path().contains(' '));
        assert!(url.query().unwrap().contains("width=1024"));
        assert!(url.query().unwrap().contains("seed=7"));
        assert!(url.query().unwrap().contains("model=flux"));
    }
}
