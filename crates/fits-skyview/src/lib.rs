//! Sky image ingestion: FITS header parsing, TAN world coordinates, display
//! rendering and pixel-to-sky point queries.

pub mod block;
pub mod config;
pub mod error;
pub mod header;
pub mod locate;
pub mod normalize;
pub mod pixels;
pub mod reader;
pub mod registry;
pub mod sanitize;
pub mod service;
pub mod value;
pub mod wcs;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use config::{RenderConfig, Stretch, DEFAULT_LOG_CONTRAST};
pub use error::{Error, Result};
pub use header::Header;
pub use locate::SkyPosition;
pub use normalize::RenderedImage;
pub use registry::SessionRegistry;
pub use service::{Ingested, SkyService};
pub use wcs::WcsMapper;
