//! # Task Optimizer Module
//!
//! Worker per l'elaborazione di un singolo file sorgente.
//!
//! Un `FileTask` produce zero o più artefatti nella directory specchio:
//! - immagine: `{base}_opt.jpeg`
//! - video: `{base}_opt.mp4`, poi `{base}_opt_R.mp4` generato dal primo
//!
//! L'idempotenza è basata solo sull'esistenza del path atteso: se esiste,
//! l'artefatto viene saltato con un avviso, indipendentemente dal contenuto
//! o dai parametri con cui era stato prodotto. Vale anche quando il path
//! compare durante l'encode (ad esempio `photo.jpg` e `photo.png` nella stessa
//! directory): la pubblicazione no-clobber fallisce e l'esito è uno skip.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::{
    config::EncodingConfig,
    error::OptimizeError,
    file_manager::{FileManager, MediaKind},
    image_processor::ImageProcessor,
    optimizer::path_resolver::{ArtifactKind, PathResolver},
    video_processor::{TranscodeEngine, VideoProcessor},
};

/// Unit of work: one source file and where its artifacts go
#[derive(Debug, Clone)]
pub struct FileTask {
    pub source: PathBuf,
    pub dest_dir: PathBuf,
    pub kind: MediaKind,
    pub encoding: EncodingConfig,
}

impl FileTask {
    /// First artifact the task would produce, used to label task-level failures
    pub fn primary_artifact(&self) -> ArtifactKind {
        match self.kind {
            MediaKind::Video => ArtifactKind::CompressedVideo,
            _ => ArtifactKind::Image,
        }
    }
}

/// Result of one artifact of a task
#[derive(Debug)]
pub enum ArtifactOutcome {
    Produced { kind: ArtifactKind, path: PathBuf },
    /// Expected path already existed
    Skipped { kind: ArtifactKind, path: PathBuf },
    Failed { kind: ArtifactKind, error: OptimizeError },
}

impl ArtifactOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Worker ottimizzato per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    engine: Arc<dyn TranscodeEngine>,
}

impl TaskOptimizer {
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self { engine }
    }

    /// Esegue il task; gli errori diventano esiti, mai panic o propagazione.
    pub async fn execute(&self, task: &FileTask) -> Vec<ArtifactOutcome> {
        let Some(base_name) = FileManager::base_name(&task.source) else {
            return vec![ArtifactOutcome::Failed {
                kind: task.primary_artifact(),
                error: OptimizeError::Validation(format!("Invalid file name: {}", task.source.display())),
            }];
        };

        match task.kind {
            MediaKind::Image => vec![self.process_image(task, &base_name).await],
            MediaKind::Video => self.process_video(task, &base_name).await,
            MediaKind::Unsupported => Vec::new(),
        }
    }

    async fn process_image(&self, task: &FileTask, base_name: &str) -> ArtifactOutcome {
        let kind = ArtifactKind::Image;
        let dest = PathResolver::artifact_path(&task.dest_dir, base_name, kind);
        if dest.exists() {
            return ArtifactOutcome::Skipped { kind, path: dest };
        }

        let processor = ImageProcessor::new(task.encoding.image_quality);
        let source = task.source.clone();
        let target = dest.clone();
        let result = tokio::task::spawn_blocking(move || processor.optimize(&source, &target))
            .await
            .unwrap_or_else(|e| Err(OptimizeError::Task(e.to_string())));

        Self::settle(kind, &dest, result)
    }

    async fn process_video(&self, task: &FileTask, base_name: &str) -> Vec<ArtifactOutcome> {
        let processor = VideoProcessor::new(Arc::clone(&self.engine), task.encoding);
        let mut outcomes = Vec::with_capacity(2);

        let compressed = PathResolver::artifact_path(&task.dest_dir, base_name, ArtifactKind::CompressedVideo);
        let first = Self::produce(ArtifactKind::CompressedVideo, &compressed, || {
            processor.compress(&task.source, &compressed)
        })
        .await;

        // The playback copy is derived from the compressed one
        let compressed_ready = !first.is_failure();
        outcomes.push(first);
        if !compressed_ready {
            debug!("Skipping playback copy of {}: compressed copy failed", task.source.display());
            return outcomes;
        }

        let playback = PathResolver::artifact_path(&task.dest_dir, base_name, ArtifactKind::PlaybackVideo);
        outcomes.push(
            Self::produce(ArtifactKind::PlaybackVideo, &playback, || {
                processor.convert_for_playback(&compressed, &playback)
            })
            .await,
        );
        outcomes
    }

    async fn produce<F, Fut>(kind: ArtifactKind, dest: &Path, run: F) -> ArtifactOutcome
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), OptimizeError>>,
    {
        if dest.exists() {
            return ArtifactOutcome::Skipped {
                kind,
                path: dest.to_path_buf(),
            };
        }
        Self::settle(kind, dest, run().await)
    }

    fn settle(kind: ArtifactKind, dest: &Path, result: Result<(), OptimizeError>) -> ArtifactOutcome {
        let path = dest.to_path_buf();
        match result {
            Ok(()) => ArtifactOutcome::Produced { kind, path },
            // Another task published the same path first
            Err(OptimizeError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} appeared while encoding, keeping the existing file", dest.display());
                ArtifactOutcome::Skipped { kind, path }
            }
            Err(error) => ArtifactOutcome::Failed { kind, error },
        }
    }
}
