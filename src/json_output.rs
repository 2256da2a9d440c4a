//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per chi pilota la pipeline
//! da un altro processo (GUI, script).
//!
//! ## Tipi di messaggi (uno per riga su stdout):
//! - `start`: Inizio processo, root sorgente e root specchio
//! - `artifact`: Un artefatto prodotto o saltato perché già presente
//! - `file_failed`: Un artefatto fallito, con causa
//! - `complete`: Fine processo con il riepilogo finale

use serde::Serialize;
use std::path::PathBuf;

use crate::config::EncodingConfig;
use crate::progress::RunSummary;

/// Stato di un artefatto nei messaggi `artifact`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Produced,
    Skipped,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del processo
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        workers: usize,
        encoding: EncodingConfig,
    },

    /// Artefatto completato o saltato
    Artifact {
        source: PathBuf,
        output: PathBuf,
        kind: &'static str,
        status: ArtifactStatus,
    },

    /// Artefatto fallito
    FileFailed { source: PathBuf, error: String },

    /// Processo completato
    Complete {
        #[serde(flatten)]
        summary: RunSummary,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_artifact_message_shape() {
        let msg = JsonMessage::Artifact {
            source: PathBuf::from("/in/photo.jpg"),
            output: PathBuf::from("/in-optimizados/photo_opt.jpeg"),
            kind: "image",
            status: ArtifactStatus::Skipped,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "artifact");
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["output"], "/in-optimizados/photo_opt.jpeg");
    }

    #[test]
    fn test_complete_message_flattens_summary() {
        let summary = RunSummary {
            files_processed: 3,
            failures: 1,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        let value = serde_json::to_value(JsonMessage::Complete { summary }).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["files_processed"], 3);
        assert_eq!(value["failures"], 1);
        assert_eq!(value["elapsed"], 2.0);
    }

    #[test]
    fn test_start_message_includes_encoding() {
        let value = serde_json::to_value(JsonMessage::Start {
            input_dir: PathBuf::from("/in"),
            output_dir: PathBuf::from("/in-optimizados"),
            total_files: 4,
            workers: 2,
            encoding: EncodingConfig::default(),
        })
        .unwrap();
        assert_eq!(value["encoding"]["video_codec"], "H.265");
        assert_eq!(value["encoding"]["preset"], "medium");
        assert_eq!(value["encoding"]["crf"], 28);
    }
}
