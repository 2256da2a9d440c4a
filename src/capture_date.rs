//! # Capture-Date Resolver
//!
//! Ricava la data di acquisizione di un file, best-effort, con tre tentativi in ordine:
//!
//! 1. **EXIF** `DateTimeOriginal` per immagini (`.jpg`, `.jpeg`, `.png`)
//! 2. **exiftool** `-CreateDate` per i video
//! 3. **Filesystem**: timestamp di ultima modifica
//!
//! Ogni passo restituisce `Option`: tag mancante, parse fallito, tool assente o
//! exit code non zero fanno semplicemente passare al passo successivo.
//! `resolve` non fallisce mai.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::file_manager::{FileManager, MediaKind};
use crate::platform::PlatformCommands;

/// Textual layout of EXIF dates, also requested from exiftool
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Image extensions whose embedded EXIF block is consulted
const EXIF_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Where a resolved timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Exif,
    MetadataTool,
    Filesystem,
}

/// Resolves capture timestamps for camera files
#[derive(Debug, Clone)]
pub struct CaptureDateResolver {
    exiftool: String,
}

impl Default for CaptureDateResolver {
    fn default() -> Self {
        Self::new(PlatformCommands::instance().get_command("exiftool"))
    }
}

impl CaptureDateResolver {
    pub fn new(exiftool: impl Into<String>) -> Self {
        Self {
            exiftool: exiftool.into(),
        }
    }

    /// Best-effort capture timestamp; always returns a value.
    pub fn resolve(&self, path: &Path) -> DateTime<Local> {
        self.resolve_with_source(path).0
    }

    pub fn resolve_with_source(&self, path: &Path) -> (DateTime<Local>, DateSource) {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if EXIF_EXTENSIONS.contains(&ext.as_str()) {
            if let Some(date) = read_exif_capture_date(path) {
                return (date, DateSource::Exif);
            }
        } else if MediaKind::classify(&ext) == MediaKind::Video {
            if let Some(date) = self.read_tool_capture_date(path) {
                return (date, DateSource::MetadataTool);
            }
        }

        (filesystem_date(path), DateSource::Filesystem)
    }

    /// Ask exiftool for the normalized `CreateDate` field.
    fn read_tool_capture_date(&self, path: &Path) -> Option<DateTime<Local>> {
        let output = Command::new(&self.exiftool)
            .args(["-CreateDate", "-d", EXIF_DATE_FORMAT, "-s3"])
            .arg(path)
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                debug!("{} unavailable for {}: {}", self.exiftool, path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                "{} failed on {}: {}",
                self.exiftool,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_exif_datetime(stdout.trim())
    }
}

/// Parse `YYYY:MM:DD HH:MM:SS` as local time.
pub fn parse_exif_datetime(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim().trim_end_matches('\0');
    let naive = NaiveDateTime::parse_from_str(value, EXIF_DATE_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn read_exif_capture_date(path: &Path) -> Option<DateTime<Local>> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF block in {}: {}", path.display(), e);
            return None;
        }
    };
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    // Raw ASCII bytes: display_value() would wrap the date in quotes
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(parse_exif_datetime),
        _ => None,
    }
}

fn filesystem_date(path: &Path) -> DateTime<Local> {
    match FileManager::modified_time(path) {
        Ok(modified) => DateTime::<Local>::from(modified),
        Err(e) => {
            debug!("No modification time for {}: {}", path.display(), e);
            Local::now()
        }
    }
}
