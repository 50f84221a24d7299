//! Translation of export options into OpenSCAD command-line arguments.

use std::fmt::Display;
use std::ops::RangeInclusive;

use super::types::{
    ExportFormat, ExportOptions, PdfOptions, PngOptions, StlOptions, SvgOptions, ThreeMfOptions,
};

/// Image size used for whichever side the caller leaves out.
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (800, 600);

/// Accepted range for STL and 3MF decimal precision.
pub const DECIMAL_PRECISION_RANGE: RangeInclusive<i64> = 1..=16;

/// Builds the format-specific arguments for `format`.
///
/// Only the option bag belonging to the format is consulted; webp and avif
/// read the png bag since they are rendered as PNG. Out-of-range decimal
/// precision values are dropped rather than rejected.
pub fn format_args(format: ExportFormat, options: &ExportOptions) -> Vec<String> {
    let mut args = ArgList::default();

    match format {
        ExportFormat::Png | ExportFormat::Webp | ExportFormat::Avif => {
            if let Some(png) = &options.png {
                png_args(&mut args, png);
            }
        }
        ExportFormat::StlBinary | ExportFormat::StlAscii => {
            if let Some(stl) = &options.stl {
                stl_args(&mut args, stl);
            }
        }
        ExportFormat::Svg => {
            if let Some(svg) = &options.svg {
                svg_args(&mut args, svg);
            }
        }
        ExportFormat::Pdf => {
            if let Some(pdf) = &options.pdf {
                pdf_args(&mut args, pdf);
            }
        }
        ExportFormat::ThreeMf => {
            if let Some(three_mf) = &options.three_mf {
                three_mf_args(&mut args, three_mf);
            }
        }
    }

    args.0
}

fn png_args(args: &mut ArgList, png: &PngOptions) {
    if png.width.is_none() && png.height.is_none() {
        return;
    }
    let width = png.width.unwrap_or(DEFAULT_IMAGE_SIZE.0);
    let height = png.height.unwrap_or(DEFAULT_IMAGE_SIZE.1);
    args.push("--imgsize");
    args.push(format!("{},{}", width, height));
}

fn stl_args(args: &mut ArgList, stl: &StlOptions) {
    args.precision("export-stl", stl.decimal_precision);
}

fn svg_args(args: &mut ArgList, svg: &SvgOptions) {
    const FAMILY: &str = "export-svg";
    args.option(FAMILY, "fill", svg.fill);
    args.option(FAMILY, "fill-color", svg.fill_color.as_ref());
    args.option(FAMILY, "stroke", svg.stroke);
    args.option(FAMILY, "stroke-color", svg.stroke_color.as_ref());
    args.option(FAMILY, "stroke-width", svg.stroke_width);
}

fn pdf_args(args: &mut ArgList, pdf: &PdfOptions) {
    const FAMILY: &str = "export-pdf";
    args.option(FAMILY, "paper-size", pdf.paper_size.as_ref());
    args.option(FAMILY, "orientation", pdf.orientation.as_ref());
    args.option(FAMILY, "show-grid", pdf.show_grid);
    args.option(FAMILY, "grid-size", pdf.grid_size);
    args.option(FAMILY, "fill", pdf.fill);
    args.option(FAMILY, "fill-color", pdf.fill_color.as_ref());
    args.option(FAMILY, "stroke", pdf.stroke);
    args.option(FAMILY, "stroke-color", pdf.stroke_color.as_ref());
    args.option(FAMILY, "stroke-width", pdf.stroke_width);
}

fn three_mf_args(args: &mut ArgList, three_mf: &ThreeMfOptions) {
    const FAMILY: &str = "export-3mf";
    args.option(FAMILY, "unit", three_mf.unit.as_ref());
    args.precision(FAMILY, three_mf.decimal_precision);
    args.option(FAMILY, "color", three_mf.color.as_ref());
    args.option(FAMILY, "color-mode", three_mf.color_mode.as_ref());
    args.option(FAMILY, "material-type", three_mf.material_type.as_ref());
    args.option(FAMILY, "add-meta-data", three_mf.add_metadata);
    args.option(FAMILY, "meta-data-title", three_mf.metadata_title.as_ref());
    args.option(FAMILY, "meta-data-designer", three_mf.metadata_designer.as_ref());
    args.option(
        FAMILY,
        "meta-data-description",
        three_mf.metadata_description.as_ref(),
    );
    args.option(
        FAMILY,
        "meta-data-copyright",
        three_mf.metadata_copyright.as_ref(),
    );
}

#[derive(Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn push(&mut self, arg: impl Into<String>) {
        self.0.push(arg.into());
    }

    /// Emits `-O family/key=value` when `value` is present.
    ///
    /// `f64` values use the shortest representation that round-trips, which
    /// never switches to exponent notation.
    fn option<T: Display>(&mut self, family: &str, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push("-O");
            self.push(format!("{}/{}={}", family, key, value));
        }
    }

    fn precision(&mut self, family: &str, value: Option<i64>) {
        let value = value.filter(|p| DECIMAL_PRECISION_RANGE.contains(p));
        self.option(family, "decimal-precision", value);
    }
}
