//! # Media Optimizados - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Unione della configurazione: CLI > file di configurazione > default
//! - Avvio della pipeline e codice di uscita
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, quality, codec, crf, workers, etc.)
//! 2. Configura il logging su stderr (INFO, DEBUG con `--verbose`, o `RUST_LOG`)
//! 3. Carica il file di configurazione e applica gli override da CLI
//! 4. Istanzia MediaOptimizer e avvia rename + ottimizzazione
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-optimizados /path/to/media --quality 85 --codec h264 --workers 4 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use media_optimizados::{Config, MediaOptimizer, Preset, VideoCodec};

#[derive(Parser)]
#[command(name = "media-optimizados")]
#[command(about = "Rename camera files by capture date and build a compressed mirror of a media tree")]
struct Args {
    /// Root directory containing the media files
    media_directory: PathBuf,

    /// JPEG quality for image artifacts (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Codec of the compressed video copy (h265, h264)
    #[arg(long)]
    codec: Option<VideoCodec>,

    /// Video CRF value (0-51, lower = better quality)
    #[arg(short, long)]
    crf: Option<u8>,

    /// Encoder speed/quality preset (ultrafast ... veryslow)
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Number of parallel workers (default: half of the hardware threads)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Suffix appended to the root for the mirrored tree
    #[arg(short, long)]
    suffix: Option<String>,

    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Skip renaming IMG_/MVI_ files before optimizing
    #[arg(long)]
    no_rename: bool,

    /// Output progress as newline-delimited JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// CLI values win over the ones loaded from file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(quality) = self.quality {
            config.encoding.image_quality = quality;
        }
        if let Some(codec) = self.codec {
            config.encoding.video_codec = codec;
        }
        if let Some(crf) = self.crf {
            config.encoding.crf = crf;
        }
        if let Some(preset) = self.preset {
            config.encoding.preset = preset;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(suffix) = &self.suffix {
            config.dest_suffix = suffix.clone();
        }
        if self.no_rename {
            config.rename_sources = false;
        }
        if self.json {
            config.json_output = true;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging on stderr so JSON output on stdout stays clean
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let file_config = match args.config.as_ref().cloned().or_else(Config::default_path) {
        Some(path) => Config::from_file(&path).await?,
        None => Config::default(),
    };
    let config = args.apply(file_config);
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save_to_file(path).await?;
        info!("Configuration saved to {}", path.display());
    }

    let optimizer = MediaOptimizer::new(config)?;
    let summary = optimizer.run(&args.media_directory).await?;

    if summary.failures > 0 {
        info!("Completed with {} failures", summary.failures);
    }

    Ok(())
}
