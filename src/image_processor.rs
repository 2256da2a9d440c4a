//! # Image Processing Module
//!
//! Questo modulo produce l'artefatto immagine `{base}_opt.jpeg`.
//!
//! ## Pipeline:
//! 1. **Decode**: il formato è rilevato dal contenuto, non dall'estensione
//! 2. **Orientamento**: applica l'orientamento EXIF, così i pixel corrispondono
//!    a come l'immagine deve essere mostrata
//! 3. **Colore**: conversione a RGB a 8 bit (alpha e scala di grigi inclusi)
//! 4. **Encode**: JPEG lossy alla qualità configurata
//!
//! ## Scrittura atomica:
//! L'output viene scritto in un file temporaneo nella directory di destinazione
//! e poi pubblicato con un rename no-clobber. Un errore a metà non lascia mai un
//! file parziale al path atteso.
//!
//! Le operazioni sono sincrone e CPU-bound: chi le chiama le esegue su
//! `tokio::task::spawn_blocking`.

use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::OptimizeError;

/// Re-encodes still images as quality-limited JPEG
#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    quality: u8,
}

impl ImageProcessor {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Decode `source`, correct its orientation and publish a JPEG at `dest`.
    pub fn optimize(&self, source: &Path, dest: &Path) -> Result<(), OptimizeError> {
        let image = Self::load_oriented(source)?;
        let rgb = image.into_rgb8();
        debug!(
            "Encoding {}x{} image at quality {}: {}",
            rgb.width(),
            rgb.height(),
            self.quality,
            source.display()
        );

        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".opt-")
            .suffix(".jpeg.part")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            JpegEncoder::new_with_quality(&mut writer, self.quality)
                .encode_image(&rgb)
                .map_err(|source| OptimizeError::Encode {
                    path: dest.to_path_buf(),
                    source,
                })?;
            writer.flush()?;
        }

        temp.persist_noclobber(dest).map_err(|e| OptimizeError::Io(e.error))?;
        Ok(())
    }

    /// Load an image with its EXIF orientation applied to the pixel buffer.
    pub fn load_oriented(source: &Path) -> Result<DynamicImage, OptimizeError> {
        let decode_err = |e: image::ImageError| OptimizeError::Decode {
            path: source.to_path_buf(),
            source: e,
        };

        let mut decoder = ImageReader::open(source)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(decode_err)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;

        if orientation != Orientation::NoTransforms {
            debug!("Applying {:?} to {}", orientation, source.display());
        }
        image.apply_orientation(orientation);
        Ok(image)
    }
}
