//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path dell'albero specchio e dei nomi degli artefatti.
//!
//! - La root specchio è la root sorgente con un suffisso (`/foto` → `/foto-optimizados`)
//! - Ogni sottodirectory sorgente ha la sua corrispondente, creata su richiesta
//! - I nomi degli artefatti derivano dal nome base del sorgente più un suffisso fisso

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::OptimizeError;

/// Artifacts a task can produce, each with a fixed name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `{base}_opt.jpeg`
    Image,
    /// `{base}_opt.mp4`, the compressed copy
    CompressedVideo,
    /// `{base}_opt_R.mp4`, derived from the compressed copy
    PlaybackVideo,
}

impl ArtifactKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Image => "_opt.jpeg",
            Self::CompressedVideo => "_opt.mp4",
            Self::PlaybackVideo => "_opt_R.mp4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::CompressedVideo => "compressed video",
            Self::PlaybackVideo => "playback video",
        }
    }
}

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Root of the mirrored tree: the source root with `dest_suffix` appended
    /// to its last component. Trailing separators are ignored.
    pub fn mirror_root(source_root: &Path, dest_suffix: &str) -> Result<PathBuf, OptimizeError> {
        let normalized: PathBuf = source_root.components().collect();
        let name = normalized.file_name().ok_or_else(|| {
            OptimizeError::Validation(format!(
                "Cannot derive a mirrored root from {}",
                source_root.display()
            ))
        })?;

        let mut mirrored = OsString::from(name);
        mirrored.push(dest_suffix);
        Ok(normalized.with_file_name(mirrored))
    }

    /// Mirror of `current_dir` under the mirrored root, without touching the disk.
    pub fn mirror_dir(
        source_root: &Path,
        dest_suffix: &str,
        current_dir: &Path,
    ) -> Result<PathBuf, OptimizeError> {
        let relative = current_dir.strip_prefix(source_root).map_err(|_| {
            OptimizeError::Validation(format!(
                "{} is not inside {}",
                current_dir.display(),
                source_root.display()
            ))
        })?;
        Ok(Self::mirror_root(source_root, dest_suffix)?.join(relative))
    }

    /// Compute the mirror of `current_dir` and create every missing directory.
    ///
    /// Safe to call concurrently for overlapping directories: "already exists"
    /// counts as success.
    pub async fn ensure_mirror_dir(
        source_root: &Path,
        dest_suffix: &str,
        current_dir: &Path,
    ) -> Result<PathBuf, OptimizeError> {
        let dest = Self::mirror_dir(source_root, dest_suffix, current_dir)?;

        match tokio::fs::create_dir_all(&dest).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dest.is_dir() => {}
            Err(source) => {
                return Err(OptimizeError::Mirror { path: dest, source });
            }
        }

        debug!("Mirror ready: {} -> {}", current_dir.display(), dest.display());
        Ok(dest)
    }

    /// Expected artifact path for a source base name
    pub fn artifact_path(dest_dir: &Path, base_name: &str, kind: ArtifactKind) -> PathBuf {
        dest_dir.join(format!("{}{}", base_name, kind.suffix()))
    }
}
