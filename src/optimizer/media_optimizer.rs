//! # Media Optimizer Main Orchestrator
//!
//! Orchestratore principale della pipeline: rename, enumerazione, esecuzione.
//!
//! ## Responsabilità:
//! - Controllo non bloccante delle dipendenze esterne (ffmpeg, exiftool)
//! - Rename dei file della fotocamera, completato prima di enumerare l'albero
//! - Enumerazione unica dell'albero sorgente e creazione dell'albero specchio
//! - Esecuzione dei task su un pool limitato di worker (`Semaphore`)
//! - Isolamento dei fallimenti: ogni errore resta confinato al proprio task
//! - Report finale con conteggi per categoria e tempo trascorso
//!
//! ## Flusso:
//! ```text
//! root ──rename──▶ root (nomi finali) ──walk──▶ FileTask[] ──pool(N)──▶ root-optimizados/
//! ```

use crate::{
    capture_date::CaptureDateResolver,
    config::Config,
    error::OptimizeError,
    file_manager::{FileManager, MediaKind},
    json_output::JsonMessage,
    optimizer::{
        path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
        task_optimizer::{ArtifactOutcome, FileTask, TaskOptimizer},
    },
    platform::PlatformCommands,
    progress::RunSummary,
    renamer::{RenameReport, Renamer},
    video_processor::{FfmpegEngine, TranscodeEngine},
};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Tasks built by one enumeration of the source tree
struct TaskPlan {
    tasks: Vec<FileTask>,
    /// Files whose mirror directory could not be created
    unreachable: Vec<(FileTask, String)>,
    ignored: usize,
}

/// Orchestratore principale
pub struct MediaOptimizer {
    config: Config,
    engine: Arc<dyn TranscodeEngine>,
}

impl MediaOptimizer {
    /// Crea nuova istanza dell'ottimizzatore con FFmpeg come motore video
    pub fn new(config: Config) -> Result<Self> {
        Self::with_engine(config, Arc::new(FfmpegEngine::default()))
    }

    /// Crea l'ottimizzatore con un motore di transcodifica esplicito
    pub fn with_engine(config: Config, engine: Arc<dyn TranscodeEngine>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    /// Esegue l'intera pipeline: dipendenze, rename, scheduling, report
    pub async fn run(&self, media_dir: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let source_root = Self::resolve_root(media_dir).await?;

        if !self.config.json_output {
            info!("Starting media optimization in: {}", source_root.display());
        }

        PlatformCommands::instance().check_dependencies().await;

        let rename_report = if self.config.rename_sources {
            Some(self.rename_sources(&source_root).await?)
        } else {
            debug!("Rename step disabled");
            None
        };

        let mut summary = self.schedule(&source_root).await?;
        if let Some(report) = &rename_report {
            summary.renamed = report.renamed;
            summary.rename_errors = report.collisions + report.failures;
        }
        summary.elapsed = start_time.elapsed();

        self.print_final_stats(&summary, rename_report.as_ref());
        Ok(summary)
    }

    async fn resolve_root(media_dir: &Path) -> Result<PathBuf> {
        let root = tokio::fs::canonicalize(media_dir)
            .await
            .with_context(|| format!("Cannot access source directory {}", media_dir.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }
        Ok(root)
    }

    /// Rename sequenziale, completato prima che l'albero venga enumerato
    async fn rename_sources(&self, source_root: &Path) -> Result<RenameReport> {
        let root = source_root.to_path_buf();
        let report = tokio::task::spawn_blocking(move || {
            Renamer::new(CaptureDateResolver::default()).rename_tree(&root)
        })
        .await
        .context("Rename step aborted")?;
        Ok(report)
    }

    /// Work scheduler: enumera `source_root` una volta, crea l'albero specchio
    /// ed esegue i task con al più `config.workers` worker attivi.
    ///
    /// I fallimenti dei singoli task finiscono nel riepilogo, mai nel `Result`.
    pub async fn schedule(&self, source_root: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let dest_root = PathResolver::mirror_root(source_root, &self.config.dest_suffix)?;
        let plan = self.build_plan(source_root).await?;

        let total = plan.tasks.len() + plan.unreachable.len();
        self.emit_start_message(source_root, &dest_root, total);

        let tracker = ProgressTracker::new(total, self.config.json_output);
        for _ in 0..plan.ignored {
            tracker.add_ignored();
        }
        for (task, cause) in &plan.unreachable {
            tracker.record(
                &task.source,
                &ArtifactOutcome::Failed {
                    kind: task.primary_artifact(),
                    error: OptimizeError::Io(std::io::Error::other(cause.clone())),
                },
            );
            tracker.file_finished(&task.source);
        }

        self.process_files_concurrently(plan.tasks, &tracker).await?;

        let summary = tracker.summary(start_time.elapsed());
        tracker.finish(&summary.format_summary());
        Ok(summary)
    }

    /// Walk the tree once: mirror every directory, classify every file
    async fn build_plan(&self, source_root: &Path) -> Result<TaskPlan> {
        let suffix = &self.config.dest_suffix;
        let mut mirrors: HashMap<PathBuf, Result<PathBuf, String>> = HashMap::new();
        let mut plan = TaskPlan {
            tasks: Vec::new(),
            unreachable: Vec::new(),
            ignored: 0,
        };

        for entry in WalkDir::new(source_root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                let mirror = PathResolver::ensure_mirror_dir(source_root, suffix, entry.path())
                    .await
                    .map_err(|e| {
                        error!("❌ {}", e);
                        e.to_string()
                    });
                mirrors.insert(entry.into_path(), mirror);
                continue;
            }

            // Symlinked files are processed like regular ones; links to
            // directories are not descended into
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink()
                    && std::fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file()));
            if !is_file {
                debug!("Ignoring non-regular entry: {}", entry.path().display());
                plan.ignored += 1;
                continue;
            }

            let kind = FileManager::classify(entry.path());
            if kind == MediaKind::Unsupported {
                debug!("Ignoring unsupported file: {}", entry.path().display());
                plan.ignored += 1;
                continue;
            }

            let source = entry.into_path();
            debug!("Queued {}: {}", kind.label(), source.display());
            let parent = source.parent().unwrap_or(source_root).to_path_buf();
            let mirror = match mirrors.get(&parent) {
                Some(mirror) => mirror.clone(),
                None => PathResolver::ensure_mirror_dir(source_root, suffix, &parent)
                    .await
                    .map_err(|e| e.to_string()),
            };

            match mirror {
                Ok(dest_dir) => plan.tasks.push(FileTask {
                    source,
                    dest_dir,
                    kind,
                    encoding: self.config.encoding,
                }),
                Err(cause) => {
                    let task = FileTask {
                        source,
                        dest_dir: PathBuf::new(),
                        kind,
                        encoding: self.config.encoding,
                    };
                    plan.unreachable.push((task, cause));
                }
            }
        }

        debug!(
            "Planned {} tasks across {} directories ({} ignored)",
            plan.tasks.len(),
            mirrors.len(),
            plan.ignored
        );
        Ok(plan)
    }

    /// Processa i task con concorrenza limitata dal semaforo
    async fn process_files_concurrently(&self, tasks: Vec<FileTask>, tracker: &ProgressTracker) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let task_optimizer = TaskOptimizer::new(Arc::clone(&self.engine));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let permit = semaphore.clone().acquire_owned().await?;
            let source = task.source.clone();
            let primary = task.primary_artifact();
            let worker = task_optimizer.clone();
            let progress = tracker.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                for outcome in worker.execute(&task).await {
                    progress.record(&task.source, &outcome);
                }
                progress.file_finished(&task.source);
            });
            handles.push((source, primary, handle));
        }

        let (sources, handles): (Vec<_>, Vec<_>) = handles
            .into_iter()
            .map(|(source, primary, handle)| ((source, primary), handle))
            .unzip();

        for ((source, primary), result) in sources.into_iter().zip(futures::future::join_all(handles).await) {
            if let Err(e) = result {
                error!("Worker for {} aborted: {}", source.display(), e);
                tracker.record(
                    &source,
                    &ArtifactOutcome::Failed {
                        kind: primary,
                        error: OptimizeError::Task(e.to_string()),
                    },
                );
                tracker.file_finished(&source);
            }
        }
        Ok(())
    }

    /// Invia messaggio di inizio
    fn emit_start_message(&self, source_root: &Path, dest_root: &Path, total_files: usize) {
        if self.config.json_output {
            JsonMessage::Start {
                input_dir: source_root.to_path_buf(),
                output_dir: dest_root.to_path_buf(),
                total_files,
                workers: self.config.workers,
                encoding: self.config.encoding,
            }
            .emit();
            return;
        }

        let encoding = &self.config.encoding;
        info!("Output directory: {}", dest_root.display());
        info!("Images: JPEG quality {}", encoding.image_quality);
        info!(
            "Videos: {} CRF {} preset {}, then H.264 playback copy",
            encoding.video_codec, encoding.crf, encoding.preset
        );
        info!("Workers: {}", self.config.workers);
        info!("Found {} media files to process", total_files);
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, summary: &RunSummary, rename_report: Option<&RenameReport>) {
        if self.config.json_output {
            JsonMessage::Complete {
                summary: summary.clone(),
            }
            .emit();
            return;
        }

        info!("✅ Optimization completed!");
        info!("{}", summary.format_summary());
        if let Some(report) = rename_report {
            info!("{}", report.format_summary());
            for (path, cause) in &report.errors {
                warn!("  • {}: {}", path.display(), cause);
            }
        }
        if !summary.failed.is_empty() {
            warn!("{} artifacts failed:", summary.failed.len());
            for failure in &summary.failed {
                warn!("  • {}: {}", failure.source.display(), failure.cause);
            }
        }
    }
}
