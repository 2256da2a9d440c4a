//! # Video Processing Module
//!
//! Questo modulo gestisce i due artefatti video prodotti tramite il motore di
//! transcodifica esterno (FFmpeg).
//!
//! ## Artefatti:
//! 1. **Copia compressa** `{base}_opt.mp4`: codec configurato (H.265 di default),
//!    CRF e preset configurati, audio ricodificato in AAC
//! 2. **Copia compatibile** `{base}_opt_R.mp4`: generata dalla copia compressa,
//!    H.264 + yuv420p + AAC con `+faststart` (indice del container in testa)
//!
//! ## Controllo qualità (CRF):
//! - 0-17: Visualmente lossless (file grandi)
//! - 18-23: Alta qualità
//! - 24-28: Buona qualità (default 28, bilanciato)
//! - 29+: File piccoli, qualità decrescente
//!
//! ## Scrittura atomica:
//! FFmpeg scrive su un file temporaneo nella directory di destinazione; solo
//! a processo terminato con successo il file viene rinominato al path atteso.
//!
//! ## Astrazione del motore:
//! `TranscodeEngine` separa la costruzione dei parametri dall'esecuzione del
//! processo, così lo scheduler può essere testato senza FFmpeg installato.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use crate::args;
use crate::config::{EncodingConfig, Preset};
use crate::error::OptimizeError;
use crate::platform::PlatformCommands;

/// Audio codec used by both passes
pub const AUDIO_CODEC: &str = "aac";
/// Video codec of the playback-compatible pass
pub const PLAYBACK_VIDEO_CODEC: &str = "libx264";
/// Pixel format of the playback-compatible pass
pub const PLAYBACK_PIXEL_FORMAT: &str = "yuv420p";

/// One invocation of the transcoding engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub video_codec: &'static str,
    pub crf: Option<u8>,
    pub preset: Option<Preset>,
    pub audio_codec: &'static str,
    pub pixel_format: Option<&'static str>,
    pub faststart: bool,
}

impl EngineJob {
    /// First pass: configured codec, CRF and preset
    pub fn compress(input: &Path, output: &Path, encoding: &EncodingConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            video_codec: encoding.video_codec.encoder(),
            crf: Some(encoding.crf),
            preset: Some(encoding.preset),
            audio_codec: AUDIO_CODEC,
            pixel_format: None,
            faststart: false,
        }
    }

    /// Second pass: widely compatible H.264/yuv420p/AAC with fast start
    pub fn playback(input: &Path, output: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            video_codec: PLAYBACK_VIDEO_CODEC,
            crf: None,
            preset: None,
            audio_codec: AUDIO_CODEC,
            pixel_format: Some(PLAYBACK_PIXEL_FORMAT),
            faststart: true,
        }
    }

    /// Encoder flags placed between the input and the output path
    pub fn encoder_args(&self) -> Vec<String> {
        let mut args = args!["-c:v", self.video_codec];
        if let Some(crf) = self.crf {
            args.extend(args!["-crf", crf]);
        }
        if let Some(preset) = self.preset {
            args.extend(args!["-preset", preset]);
        }
        args.extend(args!["-c:a", self.audio_codec]);
        if let Some(pix_fmt) = self.pixel_format {
            args.extend(args!["-pix_fmt", pix_fmt]);
        }
        if self.faststart {
            args.extend(args!["-movflags", "+faststart"]);
        }
        args
    }
}

/// External process that turns one video file into another
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    async fn transcode(&self, job: &EngineJob) -> Result<(), OptimizeError>;
}

/// FFmpeg-backed engine
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    command: String,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(PlatformCommands::instance().get_command("ffmpeg"))
    }
}

impl FfmpegEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn transcode(&self, job: &EngineJob) -> Result<(), OptimizeError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(&job.input)
            .args(job.encoder_args())
            .arg(&job.output)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(
            "🔄 {} -i {} {} {}",
            self.command,
            job.input.display(),
            job.encoder_args().join(" "),
            job.output.display()
        );
        let start_time = Instant::now();

        let output = cmd.output().await.map_err(|e| {
            OptimizeError::MissingDependency(format!("Failed to execute {}: {}", self.command, e))
        })?;

        if !output.status.success() {
            return Err(OptimizeError::engine(&self.command, output.status.code(), &output.stderr));
        }

        debug!(
            "✅ {} finished in {:.1}s",
            job.output.display(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

/// Produces the video artifacts of one source file
#[derive(Clone)]
pub struct VideoProcessor {
    engine: Arc<dyn TranscodeEngine>,
    encoding: EncodingConfig,
}

impl VideoProcessor {
    pub fn new(engine: Arc<dyn TranscodeEngine>, encoding: EncodingConfig) -> Self {
        Self { engine, encoding }
    }

    /// Compressed copy of `source` published at `dest`
    pub async fn compress(&self, source: &Path, dest: &Path) -> Result<(), OptimizeError> {
        let encoding = self.encoding;
        self.publish(dest, |temp| EngineJob::compress(source, temp, &encoding))
            .await
    }

    /// Playback-compatible copy of the compressed artifact published at `dest`
    pub async fn convert_for_playback(&self, compressed: &Path, dest: &Path) -> Result<(), OptimizeError> {
        self.publish(dest, |temp| EngineJob::playback(compressed, temp)).await
    }

    async fn publish<F>(&self, dest: &Path, build: F) -> Result<(), OptimizeError>
    where
        F: FnOnce(&Path) -> EngineJob,
    {
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        // Removed on drop unless persisted
        let temp = tempfile::Builder::new()
            .prefix(".opt-")
            .suffix(".part.mp4")
            .tempfile_in(dir)?
            .into_temp_path();

        let job = build(&temp);
        self.engine.transcode(&job).await?;

        temp.persist_noclobber(dest)
            .map_err(|e| OptimizeError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::VideoCodec;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Engine double: writes the input's bytes to the output, or fails when
    /// the input file name contains one of `fail_on`.
    #[derive(Default)]
    pub(crate) struct ScriptedEngine {
        pub fail_on: Vec<String>,
        pub calls: Mutex<Vec<EngineJob>>,
    }

    impl ScriptedEngine {
        pub fn failing_on(patterns: &[&str]) -> Self {
            Self {
                fail_on: patterns.iter().map(|p| p.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<EngineJob> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscodeEngine for ScriptedEngine {
        async fn transcode(&self, job: &EngineJob) -> Result<(), OptimizeError> {
            self.calls.lock().unwrap().push(job.clone());
            let name = job.input.file_name().unwrap_or_default().to_string_lossy().to_string();
            if self.fail_on.iter().any(|p| name.contains(p.as_str())) {
                // Simulate a partially written output before the crash
                let _ = std::fs::write(&job.output, b"truncated");
                return Err(OptimizeError::engine("ffmpeg", Some(1), b"Invalid data found when processing input"));
            }
            let data = std::fs::read(&job.input)?;
            std::fs::write(&job.output, [data.as_slice(), job.video_codec.as_bytes()].concat())?;
            Ok(())
        }
    }

    #[test]
    fn test_compress_args() {
        let encoding = EncodingConfig {
            video_codec: VideoCodec::H265,
            crf: 28,
            preset: Preset::Medium,
            ..Default::default()
        };
        let job = EngineJob::compress(Path::new("in.mov"), Path::new("out.mp4"), &encoding);
        assert_eq!(
            job.encoder_args(),
            vec!["-c:v", "libx265", "-crf", "28", "-preset", "medium", "-c:a", "aac"]
        );
    }

    #[test]
    fn test_playback_args() {
        let job = EngineJob::playback(Path::new("in_opt.mp4"), Path::new("in_opt_R.mp4"));
        assert_eq!(
            job.encoder_args(),
            vec!["-c:v", "libx264", "-c:a", "aac", "-pix_fmt", "yuv420p", "-movflags", "+faststart"]
        );
    }

    #[tokio::test]
    async fn test_publish_moves_temp_output_into_place() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mov");
        let dest = dir.path().join("clip_opt.mp4");
        std::fs::write(&source, b"movie").unwrap();

        let engine = Arc::new(ScriptedEngine::default());
        let processor = VideoProcessor::new(engine.clone(), EncodingConfig::default());
        processor.compress(&source, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"movielibx265");
        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input, source);
        assert_ne!(calls[0].output, dest);
        assert_eq!(calls[0].output.parent(), dest.parent());
        assert!(!calls[0].output.exists());
    }

    #[tokio::test]
    async fn test_engine_failure_leaves_no_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bad.mov");
        let dest = dir.path().join("bad_opt.mp4");
        std::fs::write(&source, b"movie").unwrap();

        let engine = Arc::new(ScriptedEngine::failing_on(&["bad"]));
        let processor = VideoProcessor::new(engine.clone(), EncodingConfig::default());
        let err = processor.compress(&source, &dest).await.unwrap_err();

        assert!(matches!(err, OptimizeError::Engine { .. }));
        assert!(!dest.exists());
        assert!(!engine.calls()[0].output.exists());
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_missing_dependency() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mov");
        std::fs::write(&source, b"movie").unwrap();

        let engine = Arc::new(FfmpegEngine::new("definitely-not-ffmpeg-7f3a"));
        let processor = VideoProcessor::new(engine, EncodingConfig::default());
        let err = processor
            .compress(&source, &dir.path().join("clip_opt.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, OptimizeError::MissingDependency(_)));
    }
}
