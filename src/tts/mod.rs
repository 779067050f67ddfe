use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Voice {
    pub name: String,
    pub short_name: String,
    pub gender: String,
    pub locale: String,
    pub friendly_name: Option<String>,
}

/// External speech engine. Synthesis failure is reported as `Err` and
/// absorbed by the caller; nothing here is allowed to panic.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Renders `text` with the given voice identifier, returning encoded
    /// audio bytes (mp3).
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}

pub fn create_client(config: &Config) -> Result<Arc<dyn SpeechClient>> {
    match config.audio.provider.as_str() {
        "edge-tts" => Ok(Arc::new(edge::EdgeSpeechClient::new())),
        other => Err(anyhow!("Unknown TTS provider: {}", other)),
    }
}

pub mod edge;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_unknown_provider_is_rejected() {
        let mut config = Config::default();
        config.audio.provider = "festival".to_string();
        assert!(create_client(&config).is_err());
    }

    #[test]
    fn test_default_provider_resolves() {
        let config = Config::default();
        assert!(create_client(&config).is_ok());
    }
}
