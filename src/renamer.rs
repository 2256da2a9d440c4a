//! # Renamer
//!
//! Rinomina in place i file della fotocamera (`IMG_1234.JPG`, `MVI_0042.MOV`)
//! usando la data di acquisizione: `IMG_1234.JPG` → `20231105_1234.JPG`.
//!
//! Il passaggio è strettamente sequenziale e deve terminare prima che lo
//! scheduler enumeri l'albero, perché lo scheduler legge i nomi finali.
//! Collisioni e errori del sistema operativo vengono riportati per file senza
//! interrompere la visita.

use chrono::{DateTime, Local};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::capture_date::CaptureDateResolver;
use crate::error::OptimizeError;

/// `IMG_1234.JPG` / `mvi_0042.mov`: prefix, sequence, extension
fn camera_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(IMG|MVI)_(\d+)\.(.+)$").expect("camera file pattern is valid")
    })
}

/// Outcome of one rename pass
#[derive(Debug, Default)]
pub struct RenameReport {
    pub renamed: usize,
    pub collisions: usize,
    pub failures: usize,
    /// Source path and cause for every collision or failure
    pub errors: Vec<(PathBuf, String)>,
}

impl RenameReport {
    pub fn format_summary(&self) -> String {
        format!(
            "Renamed: {} | Collisions: {} | Rename errors: {}",
            self.renamed, self.collisions, self.failures
        )
    }
}

/// Renames camera files by capture date
pub struct Renamer {
    resolver: CaptureDateResolver,
}

impl Renamer {
    pub fn new(resolver: CaptureDateResolver) -> Self {
        Self { resolver }
    }

    /// New file name for a camera file, or `None` if the name does not match.
    pub fn target_name(file_name: &str, date: DateTime<Local>) -> Option<String> {
        let captures = camera_pattern().captures(file_name)?;
        let sequence = captures.get(2)?.as_str();
        let extension = captures.get(3)?.as_str();
        Some(format!("{}_{}.{}", date.format("%Y%m%d"), sequence, extension))
    }

    /// Walk `root` and rename every matching file in its own directory.
    pub fn rename_tree(&self, root: &Path) -> RenameReport {
        info!("🔍 Looking for camera files under: {}", root.display());

        // Collect first so renames never disturb the directory walk
        let candidates: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| camera_pattern().is_match(name))
            })
            .map(|entry| entry.into_path())
            .collect();

        debug!("Found {} camera files to rename", candidates.len());

        let mut report = RenameReport::default();
        for path in candidates {
            match self.rename_file(&path) {
                Ok(target) => {
                    report.renamed += 1;
                    info!(
                        "✅ Renamed: {} → {}",
                        path.display(),
                        target.file_name().unwrap_or_default().to_string_lossy()
                    );
                }
                Err(e @ OptimizeError::RenameCollision { .. }) => {
                    report.collisions += 1;
                    warn!("⏭️ {}", e);
                    report.errors.push((path, e.to_string()));
                }
                Err(e) => {
                    report.failures += 1;
                    warn!("❌ Failed to rename {}: {}", path.display(), e);
                    report.errors.push((path, e.to_string()));
                }
            }
        }

        info!("{}", report.format_summary());
        report
    }

    fn rename_file(&self, path: &Path) -> Result<PathBuf, OptimizeError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| OptimizeError::Validation(format!("Invalid file name: {}", path.display())))?;

        let date = self.resolver.resolve(path);
        let new_name = Self::target_name(file_name, date)
            .ok_or_else(|| OptimizeError::Validation(format!("Not a camera file: {}", path.display())))?;
        let target = path.with_file_name(new_name);

        // fs::rename silently replaces on Unix
        if target.symlink_metadata().is_ok() {
            return Err(OptimizeError::RenameCollision {
                from: path.to_path_buf(),
                to: target,
            });
        }

        std::fs::rename(path, &target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn touch(path: &Path, date: DateTime<Local>) {
        std::fs::write(path, b"data").unwrap();
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::from(date)).unwrap();
    }

    fn renamer() -> Renamer {
        Renamer::new(CaptureDateResolver::new("definitely-not-exiftool-7f3a"))
    }

    #[test]
    fn test_target_name() {
        let date = Local.with_ymd_and_hms(2023, 11, 5, 10, 0, 0).unwrap();
        assert_eq!(
            Renamer::target_name("IMG_1234.JPG", date).as_deref(),
            Some("20231105_1234.JPG")
        );
        assert_eq!(
            Renamer::target_name("mvi_0042.mov", date).as_deref(),
            Some("20231105_0042.mov")
        );
        assert_eq!(Renamer::target_name("random.jpg", date), None);
        assert_eq!(Renamer::target_name("IMG_12a4.JPG", date), None);
        assert_eq!(Renamer::target_name("DSC_1234.JPG", date), None);
        assert_eq!(Renamer::target_name("IMG_1234", date), None);
    }

    #[test]
    fn test_rename_tree_uses_capture_date() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("trip");
        std::fs::create_dir(&nested).unwrap();
        let date = Local.with_ymd_and_hms(2023, 11, 5, 12, 0, 0).unwrap();

        touch(&dir.path().join("IMG_1234.JPG"), date);
        touch(&nested.join("MVI_0042.MOV"), date);
        touch(&dir.path().join("random.jpg"), date);

        let report = renamer().rename_tree(dir.path());

        assert_eq!(report.renamed, 2);
        assert_eq!(report.collisions, 0);
        assert!(dir.path().join("20231105_1234.JPG").exists());
        assert!(!dir.path().join("IMG_1234.JPG").exists());
        assert!(nested.join("20231105_0042.MOV").exists());
        assert!(dir.path().join("random.jpg").exists());
    }

    #[test]
    fn test_collision_leaves_file_unrenamed() {
        let dir = TempDir::new().unwrap();
        let date = Local.with_ymd_and_hms(2023, 11, 5, 12, 0, 0).unwrap();

        touch(&dir.path().join("IMG_0001.JPG"), date);
        std::fs::write(dir.path().join("20231105_0001.JPG"), b"existing").unwrap();

        let report = renamer().rename_tree(dir.path());

        assert_eq!(report.renamed, 0);
        assert_eq!(report.collisions, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(dir.path().join("IMG_0001.JPG").exists());
        assert_eq!(
            std::fs::read(dir.path().join("20231105_0001.JPG")).unwrap(),
            b"existing"
        );
    }

    #[test]
    fn test_collision_does_not_halt_walk() {
        let dir = TempDir::new().unwrap();
        let date = Local.with_ymd_and_hms(2022, 1, 2, 12, 0, 0).unwrap();

        touch(&dir.path().join("IMG_0001.JPG"), date);
        touch(&dir.path().join("IMG_0002.JPG"), date);
        std::fs::write(dir.path().join("20220102_0001.JPG"), b"taken").unwrap();

        let report = renamer().rename_tree(dir.path());

        assert_eq!(report.collisions, 1);
        assert_eq!(report.renamed, 1);
        assert!(dir.path().join("20220102_0002.JPG").exists());
    }

    #[test]
    fn test_exif_capture_date_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_1234.JPG");
        std::fs::write(&path, crate::test_helpers::jpeg_with_exif(8, 8, None, Some("2023:11:05 14:22:01"))).unwrap();
        // mtime points elsewhere so only the EXIF date can produce the expected name
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::from(Local.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap())).unwrap();
        drop(file);

        let report = renamer().rename_tree(dir.path());

        assert_eq!(report.renamed, 1);
        assert!(dir.path().join("20231105_1234.JPG").exists());
    }
}
