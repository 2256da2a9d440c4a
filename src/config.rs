//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di una esecuzione della pipeline.
//!
//! ## Responsabilità:
//! - Definisce `EncodingConfig`, immutabile per tutta la durata di una run
//! - Definisce `Config` con encoding, numero di worker e convenzione di naming
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `image_quality`: Qualità JPEG (1-100, default: 80)
//! - `video_codec`: Codec del primo passaggio video (default: H.265)
//! - `crf`: CRF video (0-51, default: 28, più basso = migliore qualità)
//! - `preset`: Preset velocità/qualità dell'encoder (default: medium)
//! - `workers`: Numero di worker paralleli (default: metà dei thread hardware)
//! - `dest_suffix`: Suffisso della root specchio (default: "-optimizados")
//! - `rename_sources`: Rinomina i file della fotocamera prima di ottimizzare (default: true)
//! - `json_output`: Eventi JSON su stdout invece della progress bar (default: false)
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::OptimizeError;

/// Suffix appended to the source root to build the mirrored tree.
pub const DEFAULT_DEST_SUFFIX: &str = "-optimizados";

/// Codec used for the compressed video copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VideoCodec {
    H265,
    H264,
}

impl VideoCodec {
    /// Encoder identifier understood by ffmpeg
    pub fn encoder(&self) -> &'static str {
        match self {
            Self::H265 => "libx265",
            Self::H264 => "libx264",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H265 => f.write_str("H.265"),
            Self::H264 => f.write_str("H.264"),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h.265" | "h265" | "hevc" | "libx265" | "x265" => Ok(Self::H265),
            "h.264" | "h264" | "avc" | "libx264" | "x264" => Ok(Self::H264),
            other => Err(OptimizeError::Validation(format!(
                "Unknown video codec '{}' (expected H.265 or H.264)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for VideoCodec {
    type Error = OptimizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VideoCodec> for String {
    fn from(codec: VideoCodec) -> Self {
        codec.to_string()
    }
}

/// x264/x265 speed presets, fastest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    const ALL: [Preset; 9] = [
        Self::Ultrafast,
        Self::Superfast,
        Self::Veryfast,
        Self::Faster,
        Self::Fast,
        Self::Medium,
        Self::Slow,
        Self::Slower,
        Self::Veryslow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| OptimizeError::Validation(format!("Unknown encoder preset '{}'", s)))
    }
}

impl TryFrom<String> for Preset {
    type Error = OptimizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Preset> for String {
    fn from(preset: Preset) -> Self {
        preset.as_str().to_string()
    }
}

/// Encoding parameters, fixed for the lifetime of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// JPEG quality (1-100)
    pub image_quality: u8,
    /// Codec for the compressed video copy
    pub video_codec: VideoCodec,
    /// Video CRF value (0-51, lower = better quality)
    pub crf: u8,
    /// Encoder speed preset
    pub preset: Preset,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            image_quality: 80,
            video_codec: VideoCodec::H265,
            crf: 28,
            preset: Preset::Medium,
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub encoding: EncodingConfig,
    /// Number of parallel workers
    pub workers: usize,
    /// Suffix appended to the source root for the mirrored tree
    pub dest_suffix: String,
    /// Rename IMG_/MVI_ camera files by capture date before optimizing
    pub rename_sources: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig::default(),
            workers: default_workers(),
            dest_suffix: DEFAULT_DEST_SUFFIX.to_string(),
            rename_sources: true,
            json_output: false,
        }
    }
}

/// Half of the available hardware threads, never less than one.
pub fn default_workers() -> usize {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (threads / 2).max(1)
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let encoding = &self.encoding;
        if encoding.image_quality == 0 || encoding.image_quality > 100 {
            return Err(OptimizeError::Validation("Image quality must be between 1 and 100".into()).into());
        }

        if encoding.crf > 51 {
            return Err(OptimizeError::Validation("Video CRF must be between 0 and 51".into()).into());
        }

        if self.workers == 0 {
            return Err(OptimizeError::Validation("Number of workers must be greater than 0".into()).into());
        }

        if self.dest_suffix.is_empty() {
            return Err(OptimizeError::Validation("Destination suffix must not be empty".into()).into());
        }

        if self.dest_suffix.contains(|c| c == '/' || c == '\\') {
            return Err(OptimizeError::Validation(format!(
                "Destination suffix must not contain path separators: {}",
                self.dest_suffix
            ))
            .into());
        }

        Ok(())
    }

    /// Default location of the user config file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-optimizados").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
