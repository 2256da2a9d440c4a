//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e il riepilogo finale di una run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar `indicatif`, un tick per file completato
//! - `RunSummary`: Conteggi finali per categoria di esito e tempo trascorso
//!
//! ## Statistiche tracciate:
//! - **files_processed**: File per cui è stato eseguito un task
//! - **files_ignored**: File con estensione non supportata (nessun task)
//! - **artifacts_produced**: Artefatti scritti in questa run
//! - **artifacts_skipped**: Artefatti già presenti (skip, non errore)
//! - **failures**: Artefatti falliti (decode, encode, motore esterno)
//! - **renamed** / **rename_errors**: Esito della fase di rename
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] clip_opt.mp4
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{format_elapsed, split_elapsed};

/// Manages progress reporting for a pipeline run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that never draws (JSON mode, tests)
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Print a full line above the bar without tearing it
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            tracing::info!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// A failed artifact, kept for the final report
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub cause: String,
}

/// Counts per outcome category for one run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_ignored: usize,
    pub artifacts_produced: usize,
    pub artifacts_skipped: usize,
    pub failures: usize,
    pub renamed: usize,
    pub rename_errors: usize,
    pub failed: Vec<FailureRecord>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl RunSummary {
    /// Elapsed wall-clock time as (hours, minutes, fractional seconds)
    pub fn elapsed_hms(&self) -> (u64, u64, f64) {
        split_elapsed(self.elapsed)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Produced: {} | Skipped: {} | Failures: {} | Ignored: {} | Elapsed: {}",
            self.files_processed,
            self.artifacts_produced,
            self.artifacts_skipped,
            self.failures,
            self.files_ignored,
            format_elapsed(self.elapsed)
        )
    }
}
