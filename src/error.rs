//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della pipeline.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare gli errori per singolo file
//! - Fornisce messaggi di errore descrittivi con path sorgente e causa
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Decode` / `Encode`: Immagine corrotta o non codificabile
//! - `Engine`: ffmpeg terminato con exit code diverso da zero
//! - `MissingDependency`: Tool esterno non avviabile (non presente nel PATH)
//! - `RenameCollision`: Il nome di destinazione del rename esiste già
//! - `Mirror`: Impossibile creare la directory specchio
//! - `Validation`: Errori di validazione configurazione
//! - `Task`: Il worker è terminato in modo anomalo
//!
//! La data di acquisizione non ha una variante: la risoluzione ricade sempre
//! sul timestamp del filesystem e non produce mai un errore.

use std::path::PathBuf;

/// Custom error types for the media pipeline
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{tool} exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    Engine {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Rename collision: {} already exists", .to.display())]
    RenameCollision { from: PathBuf, to: PathBuf },

    #[error("Failed to create mirror directory {}: {source}", .path.display())]
    Mirror {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Worker task aborted: {0}")]
    Task(String),
}

impl OptimizeError {
    /// Keeps only the last lines of a tool's stderr so log lines stay readable.
    pub fn engine(tool: impl Into<String>, code: Option<i32>, stderr: &[u8]) -> Self {
        const TAIL_LINES: usize = 5;
        let text = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(TAIL_LINES);
        Self::Engine {
            tool: tool.into(),
            code,
            stderr: lines[start..].join(" | "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_keeps_stderr_tail() {
        let stderr = b"line1\nline2\n\nline3\nline4\nline5\nline6\nline7\n";
        let err = OptimizeError::engine("ffmpeg", Some(1), stderr);
        let msg = err.to_string();
        assert!(msg.starts_with("ffmpeg exited with code 1"));
        assert!(msg.contains("line3 | line4 | line5 | line6 | line7"));
        assert!(!msg.contains("line2"));
    }

    #[test]
    fn test_engine_error_without_exit_code() {
        let err = OptimizeError::engine("ffmpeg", None, b"killed");
        assert_eq!(err.to_string(), "ffmpeg exited with signal: killed");
    }
}
