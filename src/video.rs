use crate::config::{ImageConfig, PipelineConfig};
use crate::error::VideoError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// One scene's inputs: a still image and, when narration succeeded, its
/// audio track.
#[derive(Debug, Clone)]
pub struct ClipSpec {
    pub image: PathBuf,
    pub audio: Option<PathBuf>,
}

/// Renders per-scene clips with ffmpeg and concatenates them into the final
/// video. Clips are encoded at a fixed frame rate with a slow linear
/// zoom-in, sized to the configured canvas.
pub struct Assembler {
    width: u32,
    height: u32,
    fps: u32,
    silent_seconds: f64,
}

impl Assembler {
    pub fn new(image: &ImageConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            width: image.width,
            height: image.height,
            fps: pipeline.fps,
            silent_seconds: pipeline.silent_scene_seconds,
        }
    }

    /// Renders one clip per entry and concatenates them, in order, into
    /// `output`. All
    /// intermediates are written under `workdir`; the caller owns its
    /// lifetime (see `BuildDir`).
    pub async fn assemble(
        &self,
        clips: &[ClipSpec],
        workdir: &Path,
        output: &Path,
    ) -> Result<(), VideoError> {
        let mut names = Vec::with_capacity(clips.len());

        for (i, clip) in clips.iter().enumerate() {
            // A track the demuxer cannot time is as good as no track.
            let (audio, duration) = match &clip.audio {
                Some(path) => match self.probe_duration(path).await {
                    Ok(d) => (Some(path.as_path()), d),
                    Err(e) => {
                        log::warn!("unreadable narration {:?}, using silence: {}", path, e);
                        (None, self.silent_seconds)
                    }
                },
                None => (None, self.silent_seconds),
            };

            let name = format!("clip_{:03}.mp4", i);
            self.render_clip(&clip.image, audio, duration, &workdir.join(&name))
                .await?;
            names.push(name);
        }

        let manifest = concat_manifest(&names);
        tokio::fs::write(workdir.join("clips.txt"), manifest).await?;

        self.concat(workdir, output).await
    }

    /// Duration of an audio file in seconds, via ffprobe.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, VideoError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(VideoError::Ffmpeg(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_duration(&stdout)
            .ok_or_else(|| VideoError::BadDuration(path.display().to_string()))
    }

    async fn render_clip(
        &self,
        image: &Path,
        audio: Option<&Path>,
        duration: f64,
        out: &Path,
    ) -> Result<(), VideoError> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loop", "1", "-i"]).arg(image);

        match audio {
            Some(path) => {
                cmd.arg("-i").arg(path);
            }
            None => {
                cmd.args([
                    "-f",
                    "lavfi",
                    "-i",
                    "anullsrc=channel_layout=mono:sample_rate=24000",
                ]);
            }
        }

        cmd.arg("-vf")
            .arg(self.zoom_filter())
            .arg("-t")
            .arg(format!("{:.3}", duration))
            .arg("-r")
            .arg(self.fps.to_string())
            .args(["-pix_fmt", "yuv420p"])
            .args(["-c:v", "libx264", "-c:a", "aac", "-shortest"])
            .arg(out);

        run_ffmpeg(cmd).await
    }

    async fn concat(&self, workdir: &Path, output: &Path) -> Result<(), VideoError> {
        let output_abs = std::path::absolute(output)?;

        let mut copy = Command::new("ffmpeg");
        copy.current_dir(workdir)
            .args(["-y", "-f", "concat", "-safe", "0", "-i", "clips.txt", "-c", "copy"])
            .arg(&output_abs);

        if run_ffmpeg(copy).await.is_ok() {
            return Ok(());
        }

        log::warn!("concat with stream copy failed, re-encoding");
        let mut reencode = Command::new("ffmpeg");
        reencode
            .current_dir(workdir)
            .args(["-y", "-f", "concat", "-safe", "0", "-i", "clips.txt"])
            .args(["-c:v", "libx264", "-c:a", "aac", "-r"])
            .arg(self.fps.to_string())
            .arg(&output_abs);

        run_ffmpeg(reencode).await
    }

    /// Scale to canvas, then zoom in linearly at 0.05x per second.
    fn zoom_filter(&self) -> String {
        format!(
            "scale={w}:{h},zoompan=z='1+0.05*in_time':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps}",
            w = self.width,
            h = self.height,
            fps = self.fps
        )
    }
}

async fn run_ffmpeg(mut cmd: Command) -> Result<(), VideoError> {
    let output = cmd.stdin(Stdio::null()).output().await?;
    if !output.status.success() {
        return Err(VideoError::Ffmpeg(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    Ok(())
}

fn parse_probe_duration(stdout: &str) -> Option<f64> {
    let seconds: f64 = stdout.trim().parse().ok()?;
    if seconds.is_finite() && seconds > 0.0 {
        Some(seconds)
    } else {
        None
    }
}

/// Concat-demuxer manifest, one clip per line, relative to the workdir.
fn concat_manifest(names: &[String]) -> String {
    let mut manifest = String::new();
    for name in names {
        manifest.push_str(&format!("file '{}'\n", name));
    }
    manifest
}

/// Per-session scratch directory for clip intermediates. Removal happens in
/// `Drop`, so cleanup runs on success, error, and panic unwinding alike.
pub struct BuildDir {
    path: PathBuf,
}

impl BuildDir {
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            log::warn!("failed to remove build dir {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_manifest_orders_clips() {
        let names = vec!["clip_000.mp4".to_string(), "clip_001.mp4".to_string()];
        assert_eq!(
            concat_manifest(&names),
            "file 'clip_000.mp4'\nfile 'clip_001.mp4'\n"
        );
    }

    #[test]
    fn test_parse_probe_duration() {
        assert_eq!(parse_probe_duration("3.456000\n"), Some(3.456));
        assert_eq!(parse_probe_duration("N/A\n"), None);
        assert_eq!(parse_probe_duration(""), None);
        assert_eq!(parse_probe_duration("-1.0"), None);
    }

    #[test]
    fn test_zoom_filter_mentions_canvas_and_rate() {
        let assembler = Assembler {
            width: 1024,
            height: 1024,
            fps: 24,
            silent_seconds: 4.0,
        };
        let filter = assembler.zoom_filter();
        assert!(filter.contains("1024x1024"));
        assert!(filter.contains("fps=24"));
        assert!(filter.contains("1+0.05*in_time"));
    }

    #[test]
    fn test_build_dir_removes_itself() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("session_ab12");
        {
            let build = BuildDir::create(path.clone()).unwrap();
            std::fs::write(build.path().join("clip_000.mp4"), b"stub").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
