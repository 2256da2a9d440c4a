//! # Media Optimizados Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della pipeline
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione della run e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `file_manager`: Classificazione dei file per estensione
//! - `capture_date`: Data di scatto (EXIF, exiftool, mtime)
//! - `renamer`: Rename dei file `IMG_`/`MVI_` per data di scatto
//! - `image_processor`: Artefatto immagine (`_opt.jpeg`)
//! - `video_processor`: Artefatti video (`_opt.mp4`, `_opt_R.mp4`) e motore FFmpeg
//! - `optimizer`: Albero specchio, task e work scheduler
//! - `progress` / `json_output`: Progress bar, riepilogo ed eventi JSON
//!
//! ## Utilizzo:
//! ```ignore
//! use media_optimizados::{Config, MediaOptimizer};
//!
//! let optimizer = MediaOptimizer::new(Config::default())?;
//! let summary = optimizer.run(Path::new("/media/fotos")).await?;
//! println!("{}", summary.format_summary());
//! ```

pub mod capture_date;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod renamer;
pub mod utils;
pub mod video_processor;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{Config, EncodingConfig, Preset, VideoCodec};
pub use error::OptimizeError;
pub use file_manager::MediaKind;
pub use optimizer::MediaOptimizer;
pub use progress::RunSummary;
