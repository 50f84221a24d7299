//! Request, response, and format types for the render module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::RenderError;

/// Output formats supported by the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "stl_binary")]
    StlBinary,
    #[serde(rename = "stl_ascii")]
    StlAscii,
    #[serde(rename = "svg")]
    Svg,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "3mf", alias = "threemf")]
    ThreeMf,
    /// Rendered as PNG, then re-encoded.
    #[serde(rename = "webp")]
    Webp,
    /// Rendered as PNG, then re-encoded.
    #[serde(rename = "avif")]
    Avif,
}

impl ExportFormat {
    /// Every supported format, in declaration order.
    pub const ALL: [ExportFormat; 8] = [
        Self::Png,
        Self::StlBinary,
        Self::StlAscii,
        Self::Svg,
        Self::Pdf,
        Self::ThreeMf,
        Self::Webp,
        Self::Avif,
    ];

    /// Wire name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::StlBinary => "stl_binary",
            Self::StlAscii => "stl_ascii",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::ThreeMf => "3mf",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// Output file extension and the `--export-format` value, empty when
    /// OpenSCAD infers the format from the extension.
    pub fn output_extension(&self) -> (&'static str, &'static str) {
        match self {
            Self::Png | Self::Webp | Self::Avif => ("png", ""),
            Self::StlBinary => ("stl", "binstl"),
            Self::StlAscii => ("stl", "asciistl"),
            Self::Svg => ("svg", ""),
            Self::Pdf => ("pdf", ""),
            Self::ThreeMf => ("3mf", ""),
        }
    }

    /// MIME type of the bytes returned for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::StlBinary | Self::StlAscii => "application/octet-stream",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
            Self::ThreeMf => "application/vnd.ms-package.3dmodel+xml",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// Whether OpenSCAD produces this format directly.
    pub fn is_native(&self) -> bool {
        !matches!(self, Self::Webp | Self::Avif)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(Self::Png),
            "stl_binary" => Ok(Self::StlBinary),
            "stl_ascii" => Ok(Self::StlAscii),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "3mf" | "threemf" => Ok(Self::ThreeMf),
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            other => Err(RenderError::InvalidFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Validates a requested format string against the supported formats.
pub fn validate_format(format: &str) -> Result<ExportFormat, RenderError> {
    format.parse()
}

/// Request to export a script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    /// OpenSCAD source code.
    #[serde(alias = "content")]
    pub scad_content: String,
    /// Requested format; validated by the renderer.
    pub format: String,
    #[serde(default)]
    pub options: ExportOptions,
}

impl ExportRequest {
    pub fn new(scad_content: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            scad_content: scad_content.into(),
            format: format.into(),
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.scad_content.is_empty() {
            return Err("scad_content is required".to_string());
        }
        if self.format.is_empty() {
            return Err("format is required".to_string());
        }
        Ok(())
    }
}

/// Format-specific export options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Also applies to webp and avif, which are rendered as PNG first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<PngOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stl: Option<StlOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<SvgOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfOptions>,
    #[serde(
        rename = "3mf",
        alias = "threemf",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_mf: Option<ThreeMfOptions>,
}

/// PNG image size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PngOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StlOptions {
    /// Only values in 1..=16 are passed on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_precision: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvgOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// a6, a5, a4, a3, letter, legal, tabloid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<String>,
    /// portrait, landscape, auto
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeMfOptions {
    /// micron, millimeter, centimeter, meter, inch, foot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Only values in 1..=16 are passed on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_precision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// model, none, selected-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<String>,
    /// color, basematerial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_metadata: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_designer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_copyright: Option<String>,
}

/// Bytes produced by an export together with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Diagnostic categories OpenSCAD can report in summary mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryKind {
    #[default]
    All,
    Cache,
    Time,
    Camera,
    Geometry,
    BoundingBox,
    Area,
}

impl SummaryKind {
    /// Value passed to `--summary`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Cache => "cache",
            Self::Time => "time",
            Self::Camera => "camera",
            Self::Geometry => "geometry",
            Self::BoundingBox => "bounding-box",
            Self::Area => "area",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to summarize a script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryRequest {
    #[serde(alias = "content")]
    pub scad_content: String,
    #[serde(default, alias = "kind")]
    pub summary_type: SummaryKind,
}

impl SummaryRequest {
    pub fn new(scad_content: impl Into<String>, summary_type: SummaryKind) -> Self {
        Self {
            scad_content: scad_content.into(),
            summary_type,
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.scad_content.is_empty() {
            return Err("scad_content is required".to_string());
        }
        Ok(())
    }
}

/// Parsed summary. The shape depends on the requested kind and the
/// OpenSCAD version, so it is kept as untyped JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: serde_json::Map<String, serde_json::Value>,
}
