//! # File Management Module
//!
//! Questo modulo gestisce la classificazione dei file e alcune utilità sui path.
//!
//! ## Responsabilità:
//! - Classificazione per estensione: immagine, video o non supportato
//! - Estrazione del nome base usato per costruire i nomi degli artefatti
//! - Lettura del timestamp di ultima modifica
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, PNG
//! - **Video**: MP4, MOV, AVI, MKV, FLV, WMV, WebM
//!
//! La classificazione è pura e case-insensitive: `photo.JPG` e `photo.jpg`
//! sono entrambe immagini. I file non supportati non generano task né errori.

use std::path::Path;
use std::time::SystemTime;

/// Image extensions, lowercase and without the leading dot
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Video extensions, lowercase and without the leading dot
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"];

/// Kind of media a source file holds, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    /// Classify an extension, with or without the leading dot.
    pub fn classify(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Unsupported
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Manages file classification and metadata lookups
pub struct FileManager;

impl FileManager {
    /// Classify a path by its extension; files without one are unsupported.
    pub fn classify(path: &Path) -> MediaKind {
        path.extension()
            .map(|ext| MediaKind::classify(&ext.to_string_lossy()))
            .unwrap_or(MediaKind::Unsupported)
    }

    /// File name without its final extension (`clip.final.mov` -> `clip.final`)
    pub fn base_name(path: &Path) -> Option<String> {
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }

    /// Last-modified timestamp of a file
    pub fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_extensions() {
        assert_eq!(MediaKind::classify(".jpg"), MediaKind::Image);
        assert_eq!(MediaKind::classify("PNG"), MediaKind::Image);
        assert_eq!(MediaKind::classify(".MOV"), MediaKind::Video);
        assert_eq!(MediaKind::classify("webm"), MediaKind::Video);
        assert_eq!(MediaKind::classify(".flv"), MediaKind::Video);
        assert_eq!(MediaKind::classify(".wmv"), MediaKind::Video);
        assert_eq!(MediaKind::classify(".txt"), MediaKind::Unsupported);
        assert_eq!(MediaKind::classify(""), MediaKind::Unsupported);
    }

    #[test]
    fn test_jpeg_and_webp_are_not_classified() {
        // Only .jpg and .png are image sources; outputs are .jpeg
        assert_eq!(MediaKind::classify(".jpeg"), MediaKind::Unsupported);
        assert_eq!(MediaKind::classify(".webp"), MediaKind::Unsupported);
    }

    #[test]
    fn test_classify_paths() {
        assert_eq!(FileManager::classify(Path::new("/a/b/photo.JPG")), MediaKind::Image);
        assert_eq!(FileManager::classify(Path::new("clip.Mp4")), MediaKind::Video);
        assert_eq!(MediaKind::Video.label(), "video");
        assert_eq!(FileManager::classify(Path::new("README")), MediaKind::Unsupported);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(FileManager::base_name(Path::new("/x/photo.jpg")).as_deref(), Some("photo"));
        assert_eq!(
            FileManager::base_name(Path::new("clip.final.mov")).as_deref(),
            Some("clip.final")
        );
    }
}
