//! Ingestion and point-query entry points shared by every caller.

use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::locate::{locate, SkyPosition};
use crate::normalize::render;
use crate::pixels::{image_shape, read_pixels};
use crate::reader::read_header_records;
use crate::registry::SessionRegistry;
use crate::sanitize::sanitize_records;
use crate::wcs::WcsMapper;

const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];

/// Output of one [`SkyService::ingest_image`] call.
#[derive(Debug)]
pub struct Ingested {
    /// 8-bit grayscale PNG of the first image plane.
    pub png: Vec<u8>,
    pub rows: usize,
    pub cols: usize,
    /// Sanitized header, one card per line.
    pub header_text: String,
    /// Why no coordinate mapping was registered, if it wasn't.
    pub wcs_error: Option<Error>,
}

impl Ingested {
    /// `true` if point queries will succeed for this image.
    pub fn wcs_registered(&self) -> bool {
        self.wcs_error.is_none()
    }
}

/// Renders FITS images and answers point queries against them.
///
/// `SkyService` is `Send + Sync`; share it behind an `Arc` to serve
/// concurrent requests.
#[derive(Debug, Default)]
pub struct SkyService {
    config: RenderConfig,
    registry: SessionRegistry,
}

impl SkyService {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Parse, render and register one FITS file held in memory.
    ///
    /// Rendering failures are returned as errors. A header without a usable
    /// coordinate mapping still renders; the reason is kept in
    /// [`Ingested::wcs_error`] and `id` is left unregistered.
    pub fn ingest_image(&self, bytes: &[u8], id: &str) -> Result<Ingested> {
        let records = read_header_records(bytes)?;
        records.require_terminated()?;

        let header_text = sanitize_records(records.records());
        let header = Header::parse(&header_text);
        debug!(
            "ingesting {id:?}: {} header cards, data at byte {}",
            header.len(),
            records.byte_len()
        );

        let data = bytes.get(records.byte_len()..).unwrap_or_default();
        let pixels = read_pixels(data, &header)?;
        let (rows, cols) = pixels.dim();
        let png = render(pixels.view(), &self.config)?.to_png()?;

        let wcs_error = match WcsMapper::from_header(&header) {
            Ok(mapper) => {
                self.registry.put(id, mapper, rows);
                None
            }
            Err(e) => {
                warn!("{id:?}: no coordinate mapping, point queries will fail: {e}");
                Some(e)
            }
        };

        Ok(Ingested {
            png,
            rows,
            cols,
            header_text,
            wcs_error,
        })
    }

    /// Read `path` and ingest it under `id`.
    pub fn ingest_file(&self, path: impl AsRef<Path>, id: &str) -> Result<Ingested> {
        let bytes = fs::read(path.as_ref())?;
        self.ingest_image(&bytes, id)
    }

    /// Register the coordinate mapping of `source` under `id` from its
    /// header alone, returning the image height.
    ///
    /// The data unit is never read, so images that cannot be rendered (a
    /// flat field, say) can still be queried.
    pub fn register_header<R: Read>(&self, source: R, id: &str) -> Result<usize> {
        let records = read_header_records(source)?;
        records.require_terminated()?;
        let header = Header::from_records(records.records());
        let (rows, _) = image_shape(&header)?;
        let mapper = WcsMapper::from_header(&header)?;
        self.registry.put(id, mapper, rows);
        Ok(rows)
    }

    /// Sky position of display pixel `(x, y)` in a previously ingested image.
    ///
    /// `x` is the 1-based column (display column index + 1); `y` is the
    /// 0-based display row from the top. See [`locate`] for details.
    pub fn locate_point(&self, id: &str, x: f64, y: f64) -> Result<SkyPosition> {
        locate(&self.registry, id, x, y)
    }
}

fn split_fits_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    FITS_EXTENSIONS
        .iter()
        .any(|e| ext.eq_ignore_ascii_case(e))
        .then_some(stem)
}

/// `true` if `name` ends in `.fits`, `.fit` or `.fts` (any case).
pub fn is_fits_filename(name: &str) -> bool {
    split_fits_extension(name).is_some()
}

/// Output name for a rendered upload: the FITS extension becomes `.png`.
/// Other names get `.png` appended.
pub fn rendered_filename(name: &str) -> String {
    let stem = split_fits_extension(name).unwrap_or(name);
    format!("{stem}.png")
}
