//! Rendering of OpenSCAD scripts.
//!
//! Each request gets its own staging directory holding `input.scad` and the
//! produced artifact. OpenSCAD runs there under a hard deadline and the
//! directory is removed afterwards, whatever the outcome.
//!
//! Formats OpenSCAD writes natively (png, stl, svg, pdf, 3mf) are returned as
//! produced. WebP and AVIF are rendered to PNG first and re-encoded.

mod config;
mod encode;
mod error;
mod openscad;
mod options;
mod runner;
mod traits;
mod types;

pub use config::RendererConfig;
pub use encode::{reencode, to_avif, to_webp, AVIF_QUALITY, AVIF_SPEED, WEBP_QUALITY};
pub use error::RenderError;
pub use openscad::OpenScadRenderer;
pub use options::{format_args, DECIMAL_PRECISION_RANGE, DEFAULT_IMAGE_SIZE};
pub use runner::{ExecutionResult, ProcessRunner, StagingArea, INPUT_FILE_NAME};
pub use traits::Renderer;
pub use types::{
    validate_format, ExportArtifact, ExportFormat, ExportOptions, ExportRequest, PdfOptions,
    PngOptions, StlOptions, SummaryKind, SummaryRequest, SummaryResponse, SvgOptions,
    ThreeMfOptions,
};
