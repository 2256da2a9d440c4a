//! # Progress Tracking Module
//!
//! Aggregatore thread-safe condiviso da tutti i worker di una run.
//!
//! ## Responsabilità:
//! - Contatori atomici per categoria di esito (prodotti, saltati, falliti, ignorati)
//! - Log append-only sincronizzato: ogni riga viene aggiunta in un'unica operazione
//! - Avanzamento della progress bar (un tick per task completato)
//! - Eventi JSON per artefatto quando l'output strutturato è attivo
//!
//! Il tracker viene creato dallo scheduler e passato esplicitamente a ogni task.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{
    json_output::{ArtifactStatus, JsonMessage},
    optimizer::task_optimizer::ArtifactOutcome,
    progress::{FailureRecord, ProgressManager, RunSummary},
};

#[derive(Default)]
struct Counters {
    files_processed: AtomicUsize,
    files_ignored: AtomicUsize,
    produced: AtomicUsize,
    skipped: AtomicUsize,
    failures: AtomicUsize,
}

/// Tracker progress condiviso tra i worker
#[derive(Clone)]
pub struct ProgressTracker {
    counters: Arc<Counters>,
    log: Arc<Mutex<Vec<String>>>,
    failed: Arc<Mutex<Vec<FailureRecord>>>,
    progress_manager: ProgressManager,
    json_output: bool,
}

/// A poisoned lock only means another worker panicked mid-push; the data is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProgressTracker {
    /// Crea un nuovo tracker; in modalità JSON la progress bar non viene disegnata
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden(total_files as u64)
        } else {
            ProgressManager::new(total_files as u64)
        };
        Self::with_manager(json_output, progress_manager)
    }

    /// Tracker senza output a terminale
    pub fn hidden(total_files: usize) -> Self {
        Self::with_manager(false, ProgressManager::hidden(total_files as u64))
    }

    fn with_manager(json_output: bool, progress_manager: ProgressManager) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            log: Arc::new(Mutex::new(Vec::new())),
            failed: Arc::new(Mutex::new(Vec::new())),
            progress_manager,
            json_output,
        }
    }

    /// Registra l'esito di un singolo artefatto
    pub fn record(&self, source: &Path, outcome: &ArtifactOutcome) {
        match outcome {
            ArtifactOutcome::Produced { kind, path } => {
                self.counters.produced.fetch_add(1, Ordering::Relaxed);
                self.append(format!("[OK] {} -> {}", source.display(), path.display()));
                if self.json_output {
                    JsonMessage::Artifact {
                        source: source.to_path_buf(),
                        output: path.clone(),
                        kind: kind.label(),
                        status: ArtifactStatus::Produced,
                    }
                    .emit();
                }
            }
            ArtifactOutcome::Skipped { kind, path } => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                self.append(format!("[SKIP] {}: already exists", path.display()));
                if self.json_output {
                    JsonMessage::Artifact {
                        source: source.to_path_buf(),
                        output: path.clone(),
                        kind: kind.label(),
                        status: ArtifactStatus::Skipped,
                    }
                    .emit();
                }
            }
            ArtifactOutcome::Failed { kind, error } => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                let cause = format!("{} failed: {}", kind.label(), error);
                self.append(format!("[ERROR] {}: {}", source.display(), cause));
                if self.json_output {
                    JsonMessage::FileFailed {
                        source: source.to_path_buf(),
                        error: cause.clone(),
                    }
                    .emit();
                }
                lock(&self.failed).push(FailureRecord {
                    source: source.to_path_buf(),
                    cause,
                });
            }
        }
    }

    /// Segna un task come completato e avanza la progress bar
    pub fn file_finished(&self, source: &Path) {
        self.counters.files_processed.fetch_add(1, Ordering::Relaxed);
        let name = source.file_name().unwrap_or_default().to_string_lossy();
        self.progress_manager.update(&name);
    }

    /// File con estensione non supportata: nessun task
    pub fn add_ignored(&self) {
        self.counters.files_ignored.fetch_add(1, Ordering::Relaxed);
    }

    fn append(&self, line: String) {
        if !self.json_output {
            self.progress_manager.println(&line);
        }
        lock(&self.log).push(line);
    }

    /// Copia del log accumulato fin qui
    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    /// Snapshot dei contatori per il report finale
    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            files_processed: self.counters.files_processed.load(Ordering::Relaxed),
            files_ignored: self.counters.files_ignored.load(Ordering::Relaxed),
            artifacts_produced: self.counters.produced.load(Ordering::Relaxed),
            artifacts_skipped: self.counters.skipped.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            failed: lock(&self.failed).clone(),
            elapsed,
            ..RunSummary::default()
        }
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }
}
