use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_gallery_file")]
    pub gallery_file: String,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_size")]
    pub width: u32,
    #[serde(default = "default_image_size")]
    pub height: u32,

    /// Appended to every prompt to steer the rendering aesthetic.
    #[serde(default = "default_style_suffix")]
    pub style_suffix: String,

    #[serde(default = "default_image_timeout")]
    pub timeout_seconds: u64,

    /// Responses at or below this size are error pages in disguise.
    #[serde(default = "default_min_image_bytes")]
    pub min_image_bytes: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String,

    #[serde(default = "default_voice")]
    pub default_voice: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_max_scenes")]
    pub max_scenes: usize,

    /// Fragments must be strictly longer than this after trimming.
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,

    /// Prompts are clipped to this length before translation.
    #[serde(default = "default_prompt_max_chars")]
    pub prompt_max_chars: usize,

    /// How many scenes fetch their assets at once within one request.
    #[serde(default = "default_scene_concurrency")]
    pub scene_concurrency: usize,

    /// Cap on generation requests running at the same time.
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    /// Clip length used when narration synthesis produced no audio.
    #[serde(default = "default_silent_scene_seconds")]
    pub silent_scene_seconds: f64,

    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_static_dir() -> String {
    "static".to_string()
}
fn default_gallery_file() -> String {
    "gallery_data.json".to_string()
}
fn default_image_endpoint() -> String {
    "https://image.pollinations.ai/prompt".to_string()
}
fn default_image_model() -> String {
    "flux".to_string()
}
fn default_image_size() -> u32 {
    1024
}
fn default_style_suffix() -> String {
    ", high quality 3D render, Pixar style, vivid colors, 4k".to_string()
}
fn default_image_timeout() -> u64 {
    120
}
fn default_min_image_bytes() -> usize {
    10_000
}
fn default_tts_provider() -> String {
    "edge-tts".to_string()
}
fn default_voice() -> String {
    "hi-IN-SwaraNeural".to_string()
}
fn default_max_scenes() -> usize {
    5
}
fn default_min_fragment_chars() -> usize {
    5
}
fn default_prompt_max_chars() -> usize {
    200
}
fn default_scene_concurrency() -> usize {
    2
}
fn default_max_jobs() -> usize {
    2
}
fn default_silent_scene_seconds() -> f64 {
    4.0
}
fn default_fps() -> u32 {
    24
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            model: default_image_model(),
            width: default_image_size(),
            height: default_image_size(),
            style_suffix: default_style_suffix(),
            timeout_seconds: default_image_timeout(),
            min_image_bytes: default_min_image_bytes(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            default_voice: default_voice(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_scenes: default_max_scenes(),
            min_fragment_chars: default_min_fragment_chars(),
            prompt_max_chars: default_prompt_max_chars(),
            scene_concurrency: default_scene_concurrency(),
            max_jobs: default_max_jobs(),
            silent_scene_seconds: default_silent_scene_seconds(),
            fps: default_fps(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            gallery_file: default_gallery_file(),
            image: ImageConfig::default(),
            audio: AudioConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Loads config.yml if present; the server boots on defaults otherwise.
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            log::info!("config.yml not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config.yml")?;
        let config: Config =
            serde_yaml_ng::from_str(&content).context("Failed to parse config.yml")?;
        Ok(config)
    }

    pub fn images_dir(&self) -> PathBuf {
        Path::new(&self.static_dir).join("images")
    }

    pub fn audio_dir(&self) -> PathBuf {
        Path::new(&self.static_dir).join("audio")
    }

    pub fn videos_dir(&self) -> PathBuf {
        Path::new(&self.static_dir).join("videos")
    }

    pub fn build_dir(&self) -> PathBuf {
        Path::new(&self.static_dir).join("build")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.audio_dir())?;
        fs::create_dir_all(self.videos_dir())?;
        fs::create_dir_all(self.build_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_yaml() {
        let config = Config::default();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let back: Config = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.bind, "0.0.0.0:5000");
        assert_eq!(back.pipeline.max_scenes, 5);
        assert_eq!(back.image.min_image_bytes, 10_000);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml_ng::from_str("bind: 127.0.0.1:8080\n").unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.audio.default_voice, "hi-IN-SwaraNeural");
        assert_eq!(config.image.width, 1024);
    }
}
