use crate::config::Config;
use crate::error::{ImageFetchError, PipelineError};
use crate::image::ImageSource;
use crate::scene::{self, Scene};
use crate::tts::SpeechClient;
use crate::video::{Assembler, BuildDir, ClipSpec};
use futures_util::{stream, StreamExt};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub story_text: String,
    pub voice_id: String,
}

/// A scene that made it through asset collection. The image is always
/// present; narration may be missing, in which case the scene becomes a
/// silent clip of default length.
#[derive(Debug)]
pub struct SceneAsset {
    pub scene: Scene,
    pub image_path: PathBuf,
    pub audio_path: Option<PathBuf>,
}

/// A scene dropped from the story, with the reason its image never arrived.
#[derive(Debug)]
pub struct SceneSkip {
    pub index: usize,
    pub reason: ImageFetchError,
}

/// Turns a story into a narrated slideshow video: split into scenes, fetch
/// an image and a narration per scene, render timed clips, concatenate.
/// One bad image skips its scene; only a story with no usable scenes at all
/// fails the request.
pub struct StoryPipeline {
    config: Arc<Config>,
    images: Arc<dyn ImageSource>,
    speech: Arc<dyn SpeechClient>,
    assembler: Assembler,
}

impl StoryPipeline {
    pub fn new(
        config: Arc<Config>,
        images: Arc<dyn ImageSource>,
        speech: Arc<dyn SpeechClient>,
    ) -> Self {
        let assembler = Assembler::new(&config.image, &config.pipeline);
        Self {
            config,
            images,
            speech,
            assembler,
        }
    }

    /// Runs the whole pipeline and returns the output file name under the
    /// videos directory.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, PipelineError> {
        let scenes = scene::split_story(
            &request.story_text,
            self.config.pipeline.min_fragment_chars,
            self.config.pipeline.max_scenes,
        );
        if scenes.is_empty() {
            return Err(PipelineError::NoScenes);
        }

        let session = hex_token(6);
        log::info!("session {}: processing {} scenes", session, scenes.len());

        let results = self
            .collect_assets(scenes, &session, &request.voice_id)
            .await;
        let assets = keep_successful(results);
        if assets.is_empty() {
            return Err(PipelineError::AllScenesFailed);
        }

        let build = BuildDir::create(self.config.build_dir().join(&session))?;
        let clips: Vec<ClipSpec> = assets
            .iter()
            .map(|asset| ClipSpec {
                image: asset.image_path.clone(),
                audio: asset.audio_path.clone(),
            })
            .collect();

        let out_name = format!("story_{}.mp4", session);
        let out_path = self.config.videos_dir().join(&out_name);
        self.assembler
            .assemble(&clips, build.path(), &out_path)
            .await?;

        log::info!("session {}: wrote {:?}", session, out_path);
        Ok(out_name)
    }

    /// Resolves every scene to an explicit per-scene result, in original
    /// order. Scenes run through an order-preserving bounded stream, so
    /// independent fetches overlap without reordering the story.
    async fn collect_assets(
        &self,
        scenes: Vec<Scene>,
        session: &str,
        voice: &str,
    ) -> Vec<Result<SceneAsset, SceneSkip>> {
        let concurrency = self.config.pipeline.scene_concurrency.max(1);
        stream::iter(scenes)
            .map(|scene| self.scene_asset(scene, session, voice))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn scene_asset(
        &self,
        scene: Scene,
        session: &str,
        voice: &str,
    ) -> Result<SceneAsset, SceneSkip> {
        let image_path = self
            .config
            .images_dir()
            .join(format!("vid_{}_{}.png", session, scene.index));

        if let Err(reason) = self.images.fetch(&scene.text, &image_path).await {
            return Err(SceneSkip {
                index: scene.index,
                reason,
            });
        }

        let audio_path = self
            .config
            .audio_dir()
            .join(format!("aud_{}_{}.mp3", session, scene.index));
        let audio_path = match self.speech.synthesize(&scene.text, voice).await {
            Ok(bytes) => match tokio::fs::write(&audio_path, &bytes).await {
                Ok(()) => Some(audio_path),
                Err(e) => {
                    log::warn!("failed to write narration for scene {}: {}", scene.index, e);
                    None
                }
            },
            Err(e) => {
                log::warn!(
                    "narration failed for scene {}, falling back to silence: {}",
                    scene.index,
                    e
                );
                None
            }
        };

        Ok(SceneAsset {
            scene,
            image_path,
            audio_path,
        })
    }
}

/// Folds per-scene results into the surviving assets, preserving order.
fn keep_successful(results: Vec<Result<SceneAsset, SceneSkip>>) -> Vec<SceneAsset> {
    let mut assets = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(asset) => assets.push(asset),
            Err(skip) if skip.reason.is_transient() => {
                log::warn!(
                    "scene {} skipped, upstream may recover: {}",
                    skip.index,
                    skip.reason
                );
            }
            Err(skip) => log::warn!("scene {} skipped: {}", skip.index, skip.reason),
        }
    }
    assets
}

/// Random lowercase hex token used to namespace one request's files.
pub fn hex_token(len: usize) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockImages {
        calls: AtomicUsize,
        fail_when_contains: Option<&'static str>,
    }

    impl MockImages {
        fn new(fail_when_contains: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_when_contains,
            }
        }
    }

    #[async_trait]
    impl ImageSource for MockImages {
        async fn fetch(&self, prompt: &str, dest: &Path) -> Result<u64, ImageFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_when_contains {
                if prompt.contains(marker) {
                    return Err(ImageFetchError::TooSmall(42));
                }
            }
            tokio::fs::write(dest, b"fake png bytes").await?;
            Ok(14)
        }
    }

    struct MockSpeech {
        calls: AtomicUsize,
        should_fail: bool,
    }

    impl MockSpeech {
        fn new(should_fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                should_fail,
            }
        }
    }

    #[async_trait]
    impl crate::tts::SpeechClient for MockSpeech {
        async fn list_voices(&self) -> Result<Vec<crate::tts::Voice>> {
            Ok(vec![])
        }

        async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(anyhow!("mock TTS error"))
            } else {
                Ok(vec![0u8; 16])
            }
        }
    }

    fn test_config(root: &Path) -> Arc<Config> {
        let mut config = Config::default();
        config.static_dir = root.to_string_lossy().to_string();
        config.ensure_directories().unwrap();
        Arc::new(config)
    }

    fn request(story: &str) -> GenerationRequest {
        GenerationRequest {
            story_text: story.to_string(),
            voice_id: "hi-IN-SwaraNeural".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_scenes_fails_before_any_external_call() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(MockImages::new(None));
        let speech = Arc::new(MockSpeech::new(false));
        let pipeline = StoryPipeline::new(test_config(dir.path()), images.clone(), speech.clone());

        let result = pipeline.generate(&request("Hi. Ok. No.")).await;
        assert!(matches!(result, Err(PipelineError::NoScenes)));
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_scenes_failed_writes_no_video() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let images = Arc::new(MockImages::new(Some("sentence")));
        let speech = Arc::new(MockSpeech::new(false));
        let pipeline = StoryPipeline::new(config.clone(), images, speech.clone());

        let result = pipeline
            .generate(&request("First sentence here. Second sentence here."))
            .await;
        assert!(matches!(result, Err(PipelineError::AllScenesFailed)));

        // No audio fetched for skipped scenes, no video produced.
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
        let videos: Vec<_> = std::fs::read_dir(config.videos_dir())
            .unwrap()
            .collect();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn test_failed_scene_is_skipped_and_order_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let images = Arc::new(MockImages::new(Some("unlucky")));
        let speech = Arc::new(MockSpeech::new(false));
        let pipeline = StoryPipeline::new(config, images, speech);

        let scenes = crate::scene::split_story(
            "The story starts well. An unlucky scene follows. The ending still lands.",
            5,
            5,
        );
        let results = pipeline.collect_assets(scenes, "abc123", "voice").await;
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());

        let assets = keep_successful(results);
        let indices: Vec<_> = assets.iter().map(|a| a.scene.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(assets.iter().all(|a| a.image_path.exists()));
        assert!(assets.iter().all(|a| a.audio_path.is_some()));
    }

    #[tokio::test]
    async fn test_narration_failure_degrades_to_silent_scene() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let images = Arc::new(MockImages::new(None));
        let speech = Arc::new(MockSpeech::new(true));
        let pipeline = StoryPipeline::new(config, images, speech);

        let scenes = crate::scene::split_story("A cat sits on a mat quietly.", 5, 5);
        let results = pipeline.collect_assets(scenes, "abc123", "voice").await;
        let assets = keep_successful(results);

        assert_eq!(assets.len(), 1);
        assert!(assets[0].audio_path.is_none());
        assert!(assets[0].image_path.exists());
    }

    #[test]
    fn test_hex_token_shape() {
        let token = hex_token(6);
        assert_eq!(token.len(), 6);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        // Two draws colliding would mean the generator is broken.
        assert_ne!(hex_token(16), hex_token(16));
    }
}
