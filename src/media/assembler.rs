//! Video assembly from still images and a narration track.

use super::ffmpeg::{probe_duration, run_ffmpeg};
use crate::config::VideoSettings;
use crate::error::{Gener8Error, Result};
use futures::stream::{self, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A still image shown on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedImage {
    pub image_path: PathBuf,
    /// Start of the display window in seconds.
    pub start_time: f64,
    /// Length of the display window in seconds.
    pub duration: f64,
}

impl TimedImage {
    pub fn new(image_path: impl Into<PathBuf>, start_time: f64, duration: f64) -> Self {
        Self {
            image_path: image_path.into(),
            start_time,
            duration,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    fn validate(&self) -> Result<()> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(Gener8Error::Render(format!(
                "{}: start time must be a non-negative number, got {}",
                self.image_path.display(),
                self.start_time
            )));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(Gener8Error::Render(format!(
                "{}: duration must be positive, got {}",
                self.image_path.display(),
                self.duration
            )));
        }
        Ok(())
    }
}

impl std::str::FromStr for TimedImage {
    type Err = String;

    /// Parse `PATH:START:DURATION`. The path itself may contain colons.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(duration), Some(start), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("Expected PATH:START:DURATION, got '{}'", s));
        };

        let start: f64 = start
            .trim()
            .parse()
            .map_err(|_| format!("Invalid start time '{}'", start))?;
        let duration: f64 = duration
            .trim()
            .parse()
            .map_err(|_| format!("Invalid duration '{}'", duration))?;

        if path.is_empty() {
            return Err(format!("Missing image path in '{}'", s));
        }
        Ok(TimedImage::new(path, start, duration))
    }
}

/// A successfully rendered video.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub output_path: PathBuf,
    /// Duration of the produced file, as reported by ffprobe.
    pub duration_seconds: f64,
    /// Image layers that appear before the audio ends.
    pub image_count: usize,
}

/// Lays images out over a black canvas and muxes them with narration.
pub struct VideoAssembler {
    settings: VideoSettings,
}

impl VideoAssembler {
    pub fn new(settings: VideoSettings) -> Self {
        Self { settings }
    }

    /// Render `images` over the audio track at `audio` into `output`.
    ///
    /// Output length always equals the audio length: layers running past the
    /// end are cut and uncovered time is black.
    #[instrument(skip(self, images), fields(audio = %audio.display(), images = images.len()))]
    pub async fn assemble(
        &self,
        audio: &Path,
        images: &[TimedImage],
        output: &Path,
    ) -> Result<RenderOutput> {
        if !tokio::fs::metadata(audio).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(Gener8Error::Render(format!(
                "Audio file not found: {}",
                audio.display()
            )));
        }

        for image in images {
            image.validate()?;
        }
        self.check_images_exist(images).await?;

        let audio_duration = probe_duration(audio).await.map_err(render_error)?;
        if audio_duration <= 0.0 {
            return Err(Gener8Error::Render(format!(
                "Audio file has no duration: {}",
                audio.display()
            )));
        }

        let visible: Vec<TimedImage> = images
            .iter()
            .filter(|image| image.start_time < audio_duration)
            .map(|image| TimedImage {
                duration: image.duration.min(audio_duration - image.start_time),
                ..image.clone()
            })
            .collect();
        if visible.len() < images.len() {
            warn!(
                "{} image(s) start after the audio ends and were dropped",
                images.len() - visible.len()
            );
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            "Rendering {} layers over {:.2}s of audio",
            visible.len(),
            audio_duration
        );
        let args = self.build_args(audio, &visible, audio_duration, output);
        run_ffmpeg(&args).await.map_err(render_error)?;

        let duration_seconds = probe_duration(output).await.map_err(render_error)?;
        info!("Video created successfully: {}", output.display());

        Ok(RenderOutput {
            output_path: output.to_path_buf(),
            duration_seconds,
            image_count: visible.len(),
        })
    }

    async fn check_images_exist(&self, images: &[TimedImage]) -> Result<()> {
        stream::iter(images.iter().map(Ok::<_, Gener8Error>))
            .try_for_each_concurrent(self.settings.max_concurrent_probes.max(1), |image| {
                async move {
                    match tokio::fs::metadata(&image.image_path).await {
                        Ok(meta) if meta.is_file() => Ok(()),
                        _ => Err(Gener8Error::Render(format!(
                            "Image file not found: {}",
                            image.image_path.display()
                        ))),
                    }
                }
            })
            .await
    }

    /// Build the ffmpeg filter graph that composites `images` onto the canvas.
    ///
    /// Input 0 is the canvas, inputs `1..=n` are the images. The result is
    /// labelled `[vout]`.
    pub fn build_filter_graph(&self, images: &[TimedImage]) -> String {
        let mut filters = Vec::with_capacity(images.len() * 2 + 1);
        let mut previous = "0:v".to_string();

        for (idx, image) in images.iter().enumerate() {
            let start = image.start_time;
            let end = image.end_time();
            filters.push(format!(
                "[{input}:v]scale=-2:{height},setsar=1,format=rgba,setpts=PTS-STARTPTS+{start:.3}/TB[img{idx}]",
                input = idx + 1,
                height = self.settings.image_height,
            ));
            filters.push(format!(
                "[{previous}][img{idx}]overlay=x=(W-w)/2:y=(H-h)/2:eof_action=pass:enable='between(t,{start:.3},{end:.3})'[v{idx}]"
            ));
            previous = format!("v{idx}");
        }

        filters.push(format!("[{previous}]format=yuv420p[vout]"));
        filters.join(";")
    }

    fn build_args(
        &self,
        audio: &Path,
        images: &[TimedImage],
        duration: f64,
        output: &Path,
    ) -> Vec<OsString> {
        let s = &self.settings;
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            format!(
                "color=c=black:s={}x{}:r={}:d={:.3}",
                s.width, s.height, s.fps, duration
            )
            .into(),
        ];

        for image in images {
            args.extend([
                "-loop".into(),
                "1".into(),
                "-framerate".into(),
                s.fps.to_string().into(),
                "-t".into(),
                format!("{:.3}", image.duration).into(),
                "-i".into(),
                image.image_path.clone().into_os_string(),
            ]);
        }

        args.extend([
            OsString::from("-i"),
            audio.as_os_str().to_os_string(),
            "-filter_complex".into(),
            self.build_filter_graph(images).into(),
            "-map".into(),
            "[vout]".into(),
            "-map".into(),
            format!("{}:a:0", images.len() + 1).into(),
            "-c:v".into(),
            s.video_codec.clone().into(),
            "-r".into(),
            s.fps.to_string().into(),
            "-c:a".into(),
            s.audio_codec.clone().into(),
            "-t".into(),
            format!("{:.3}", duration).into(),
            "-movflags".into(),
            "+faststart".into(),
            output.as_os_str().to_os_string(),
        ]);

        args
    }
}

/// Keep `ToolNotFound` as is and report every other failure as `Render`.
pub(crate) fn render_error(e: Gener8Error) -> Gener8Error {
    match e {
        Gener8Error::ToolNotFound(_) => e,
        other => Gener8Error::Render(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::media::ffmpeg::encoder_available;
    use tokio::process::Command;

    fn assembler() -> VideoAssembler {
        VideoAssembler::new(VideoSettings::default())
    }

    #[test]
    fn test_parse_timed_image() {
        let image: TimedImage = "image1.jpg:0:5".parse().unwrap();
        assert_eq!(image, TimedImage::new("image1.jpg", 0.0, 5.0));

        let image: TimedImage = "C:/pics/a.png:2.5:1.25".parse().unwrap();
        assert_eq!(image.image_path, PathBuf::from("C:/pics/a.png"));
        assert_eq!(image.end_time(), 3.75);

        assert!("image1.jpg:5".parse::<TimedImage>().is_err());
        assert!("image1.jpg:x:5".parse::<TimedImage>().is_err());
        assert!(":0:5".parse::<TimedImage>().is_err());
    }

    #[test]
    fn test_filter_graph_without_images() {
        assert_eq!(assembler().build_filter_graph(&[]), "[0:v]format=yuv420p[vout]");
    }

    #[test]
    fn test_filter_graph_chains_overlays() {
        let images = vec![
            TimedImage::new("a.jpg", 0.0, 5.0),
            TimedImage::new("b.jpg", 4.0, 2.5),
        ];
        let graph = assembler().build_filter_graph(&images);

        assert!(graph.contains("[1:v]scale=-2:720,setsar=1,format=rgba,setpts=PTS-STARTPTS+0.000/TB[img0]"));
        assert!(graph.contains("[0:v][img0]overlay=x=(W-w)/2:y=(H-h)/2:eof_action=pass:enable='between(t,0.000,5.000)'[v0]"));
        assert!(graph.contains("[v0][img1]overlay="));
        assert!(graph.contains("between(t,4.000,6.500)"));
        assert!(graph.ends_with("[v1]format=yuv420p[vout]"));
    }

    #[test]
    fn test_args_clamp_to_audio() {
        let images = vec![TimedImage::new("a.jpg", 0.0, 2.0)];
        let args = assembler().build_args(Path::new("n.mp3"), &images, 3.5, Path::new("out.mp4"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert!(args.contains(&"color=c=black:s=1280x720:r=24:d=3.500".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "2:a:0"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-r" && w[1] == "24"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "3.500"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[tokio::test]
    async fn test_missing_audio_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = assembler()
            .assemble(&dir.path().join("none.mp3"), &[], &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(Gener8Error::Render(_))));
    }

    #[tokio::test]
    async fn test_missing_image_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("a.mp3");
        std::fs::write(&audio, b"ID3").unwrap();

        let images = vec![TimedImage::new(dir.path().join("missing.jpg"), 0.0, 5.0)];
        let result = assembler()
            .assemble(&audio, &images, &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(Gener8Error::Render(msg)) if msg.contains("missing.jpg")));
        assert!(!dir.path().join("out.mp4").exists());
    }

    #[tokio::test]
    async fn test_zero_duration_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("a.mp3");
        let image = dir.path().join("a.png");
        std::fs::write(&audio, b"ID3").unwrap();
        std::fs::write(&image, b"PNG").unwrap();

        let images = vec![TimedImage::new(&image, 1.0, 0.0)];
        let result = assembler()
            .assemble(&audio, &images, &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(Gener8Error::Render(msg)) if msg.contains("duration")));
    }

    /// ffmpeg with libx264 is required for real renders; skip otherwise.
    pub(crate) async fn ffmpeg_ready() -> bool {
        let probe_ok = Command::new("ffprobe")
            .arg("-version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false);
        probe_ok && encoder_available("libx264").await
    }

    pub(crate) async fn make_tone(path: &Path, seconds: f64) {
        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={}", seconds))
            .args(["-c:a", "aac"])
            .arg(path)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }

    pub(crate) async fn make_image(path: &Path, size: &str) {
        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
            .arg(format!("color=c=red:s={}", size))
            .args(["-frames:v", "1", "-update", "1"])
            .arg(path)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }

    const FRAME: f64 = 1.0 / 24.0;

    #[tokio::test]
    async fn test_render_truncates_to_audio() {
        if !ffmpeg_ready().await {
            eprintln!("skipping: ffmpeg with libx264 not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("tone.m4a");
        let image = dir.path().join("red.png");
        make_tone(&audio, 3.0).await;
        make_image(&image, "320x240").await;

        let images = vec![
            TimedImage::new(&image, 0.0, 2.0),
            TimedImage::new(&image, 2.0, 5.0),
            TimedImage::new(&image, 10.0, 1.0),
        ];
        let output = dir.path().join("out").join("video.mp4");
        let rendered = assembler().assemble(&audio, &images, &output).await.unwrap();

        assert!(output.exists());
        assert_eq!(rendered.image_count, 2);
        assert!(
            (rendered.duration_seconds - 3.0).abs() <= FRAME,
            "duration was {}",
            rendered.duration_seconds
        );
    }

    #[tokio::test]
    async fn test_render_without_images() {
        if !ffmpeg_ready().await {
            eprintln!("skipping: ffmpeg with libx264 not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("tone.m4a");
        make_tone(&audio, 2.0).await;

        let output = dir.path().join("blank.mp4");
        let rendered = assembler().assemble(&audio, &[], &output).await.unwrap();

        assert_eq!(rendered.image_count, 0);
        assert!((rendered.duration_seconds - 2.0).abs() <= FRAME);
    }
}
