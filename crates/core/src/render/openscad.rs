//! OpenSCAD-based renderer implementation.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::RendererConfig;
use super::encode;
use super::error::RenderError;
use super::options::format_args;
use super::runner::{ProcessRunner, StagingArea};
use super::traits::Renderer;
use super::types::{
    validate_format, ExportArtifact, ExportFormat, ExportOptions, ExportRequest, SummaryKind,
    SummaryRequest, SummaryResponse,
};
use crate::metrics::{RENDERS_TOTAL, RENDER_DURATION};

/// Summary data written by `--summary-file`.
const SUMMARY_FILE_NAME: &str = "summary.json";

/// Throwaway primary output; OpenSCAD needs one even in summary mode.
const DUMMY_OUTPUT_NAME: &str = "dummy.stl";

const EXPORT_STAGING_PREFIX: &str = "scad-export-";
const SUMMARY_STAGING_PREFIX: &str = "scad-summary-";

/// OpenSCAD-based renderer implementation.
pub struct OpenScadRenderer {
    config: RendererConfig,
    runner: ProcessRunner,
}

impl OpenScadRenderer {
    /// Creates a new renderer with the given configuration.
    pub fn new(config: RendererConfig) -> Self {
        let runner = ProcessRunner::from_config(&config);
        Self { config, runner }
    }

    /// Creates a renderer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RendererConfig::default())
    }

    /// Builds openscad arguments for an export.
    ///
    /// The output flag comes first and the input path last; format flags sit
    /// in between since openscad reads them before the input.
    fn build_export_args(
        &self,
        format: ExportFormat,
        options: &ExportOptions,
        output_path: &Path,
        input_path: &Path,
    ) -> Vec<String> {
        let mut args = vec!["-o".to_string(), path_arg(output_path)];

        let (_, export_format) = format.output_extension();
        if !export_format.is_empty() {
            args.extend(["--export-format".to_string(), export_format.to_string()]);
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.extend(format_args(format, options));
        args.push(path_arg(input_path));

        args
    }

    /// Builds openscad arguments for a summary.
    fn build_summary_args(
        kind: SummaryKind,
        summary_path: &Path,
        dummy_output: &Path,
        input_path: &Path,
    ) -> Vec<String> {
        vec![
            "--summary".to_string(),
            kind.as_str().to_string(),
            "--summary-file".to_string(),
            path_arg(summary_path),
            "-o".to_string(),
            path_arg(dummy_output),
            path_arg(input_path),
        ]
    }

    /// Parses the summary file into a JSON object.
    fn parse_summary(data: &[u8]) -> Result<SummaryResponse, RenderError> {
        let summary = serde_json::from_slice(data).map_err(|e| RenderError::Parse {
            reason: e.to_string(),
        })?;
        Ok(SummaryResponse { summary })
    }

    async fn run_export(&self, request: &ExportRequest) -> Result<ExportArtifact, RenderError> {
        let format = validate_format(&request.format)?;
        info!(
            "Export requested: format={}, options={:?}",
            format, request.options
        );

        let (extension, _) = format.output_extension();
        let output_name = format!("output.{}", extension);

        let rendered = self
            .runner
            .stage_and_run(
                EXPORT_STAGING_PREFIX,
                &request.scad_content,
                |staging: &StagingArea, input: &Path| {
                    let output = staging.join(&output_name);
                    let args = self.build_export_args(format, &request.options, &output, input);
                    (args, output)
                },
            )
            .await?;

        let data = encode::reencode(format, rendered).await?;
        info!("Export finished: format={}, {} bytes", format, data.len());

        Ok(ExportArtifact {
            data,
            content_type: format.content_type(),
        })
    }

    async fn run_summary(&self, request: &SummaryRequest) -> Result<SummaryResponse, RenderError> {
        let kind = request.summary_type;
        info!("Summary requested: kind={}", kind);

        let data = self
            .runner
            .stage_and_run(
                SUMMARY_STAGING_PREFIX,
                &request.scad_content,
                |staging: &StagingArea, input: &Path| {
                    let summary_path = staging.join(SUMMARY_FILE_NAME);
                    let args = Self::build_summary_args(
                        kind,
                        &summary_path,
                        &staging.join(DUMMY_OUTPUT_NAME),
                        input,
                    );
                    (args, summary_path)
                },
            )
            .await?;

        let response = Self::parse_summary(&data)?;
        debug!(
            "Summary keys: {:?}",
            response.summary.keys().collect::<Vec<_>>()
        );
        Ok(response)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn record<T>(operation: &str, format: &str, started: Instant, result: &Result<T, RenderError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => {
            warn!("OpenSCAD {} error: {}", operation, e);
            e.kind()
        }
    };
    RENDERS_TOTAL
        .with_label_values(&[operation, format, outcome])
        .inc();
    RENDER_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

#[async_trait]
impl Renderer for OpenScadRenderer {
    fn name(&self) -> &str {
        "openscad"
    }

    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, RenderError> {
        let started = Instant::now();
        let result = self.run_export(request).await;
        let format_label = validate_format(&request.format)
            .map(|f| f.as_str())
            .unwrap_or("unsupported");
        record("export", format_label, started, &result);
        result
    }

    async fn summary(&self, request: &SummaryRequest) -> Result<SummaryResponse, RenderError> {
        let started = Instant::now();
        let result = self.run_summary(request).await;
        record("summary", request.summary_type.as_str(), started, &result);
        result
    }

    async fn validate(&self) -> Result<(), RenderError> {
        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|e| {
                RenderError::staging(
                    format!("failed to create {}", self.config.temp_dir.display()),
                    e,
                )
            })?;

        let result = self
            .runner
            .run(&["--version".to_string()], &self.config.temp_dir)
            .await?;
        let result = self.runner.check(result)?;
        info!("Found {}", result.output.trim());

        Ok(())
    }
}


#[cfg(all(test, unix))]
mod fake_binary_tests {
    use super::*;
    use crate::render::encode::tests::test_png;
    use crate::render::types::PngOptions;
    use crate::testing::FakeOpenScad;
    use std::time::Duration;

    fn renderer_for(fake: &FakeOpenScad, timeout_secs: u64) -> OpenScadRenderer {
        OpenScadRenderer::new(fake.config().with_timeout(timeout_secs))
    }

    #[tokio::test]
    async fn test_export_png_returns_rendered_bytes() {
        let png = test_png(8, 8);
        let fake = FakeOpenScad::builder().output(png.clone()).build().unwrap();
        let renderer = renderer_for(&fake, 10);

        let request = ExportRequest::new("cube([10,10,10]);", "png").with_options(ExportOptions {
            png: Some(PngOptions {
                width: Some(800),
                height: Some(600),
            }),
            ..Default::default()
        });
        let artifact = renderer.export(&request).await.unwrap();
        assert_eq!(artifact.content_type, "image/png");
        assert_eq!(artifact.data, png);

        let args = fake.recorded_args();
        assert_eq!(args[0], "-o");
        assert!(args[1].ends_with("/output.png"));
        assert_eq!(&args[2..4], &["--imgsize".to_string(), "800,600".to_string()]);
        assert!(args[4].ends_with("/input.scad"));
        assert_eq!(fake.staging_dirs_left(), 0);
    }

    #[tokio::test]
    async fn test_export_webp_and_avif_are_reencoded() {
        let fake = FakeOpenScad::builder().output(test_png(16, 16)).build().unwrap();
        let renderer = renderer_for(&fake, 10);

        let webp = renderer
            .export(&ExportRequest::new("cube(1);", "webp"))
            .await
            .unwrap();
        assert_eq!(webp.content_type, "image/webp");
        assert_eq!(&webp.data[0..4], b"RIFF");
        assert!(fake.recorded_args()[1].ends_with("/output.png"));

        let avif = renderer
            .export(&ExportRequest::new("cube(1);", "avif"))
            .await
            .unwrap();
        assert_eq!(avif.content_type, "image/avif");
        assert!(avif.data.windows(4).any(|w| w == b"ftyp"));
    }

    #[tokio::test]
    async fn test_export_webp_with_garbage_render_is_decode_error() {
        let fake = FakeOpenScad::builder().output(b"not a png".to_vec()).build().unwrap();
        let renderer = renderer_for(&fake, 10);

        let err = renderer
            .export(&ExportRequest::new("cube(1);", "webp"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_export_process_failure_carries_output() {
        let fake = FakeOpenScad::builder()
            .stderr("ERROR: Parser error in file input.scad, line 1")
            .exit_code(1)
            .build()
            .unwrap();
        let renderer = renderer_for(&fake, 10);

        let err = renderer
            .export(&ExportRequest::new("cube(", "stl_binary"))
            .await
            .unwrap_err();
        match err {
            RenderError::ProcessFailed { output, .. } => {
                assert!(output.contains("Parser error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fake.staging_dirs_left(), 0);
    }

    #[tokio::test]
    async fn test_export_missing_output_is_read_failure() {
        let fake = FakeOpenScad::builder().build().unwrap();
        let renderer = renderer_for(&fake, 10);

        let err = renderer
            .export(&ExportRequest::new("cube(1);", "svg"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_export_timeout_removes_staging() {
        let fake = FakeOpenScad::builder()
            .output(test_png(4, 4))
            .sleep_secs(30)
            .build()
            .unwrap();
        let renderer = renderer_for(&fake, 1);

        let err = renderer
            .export(&ExportRequest::new("cube(1);", "png"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::DeadlineExceeded { timeout } if timeout == Duration::from_secs(1)
        ));
        assert_eq!(fake.staging_dirs_left(), 0);
    }

    #[tokio::test]
    async fn test_summary_parses_geometry() {
        let fake = FakeOpenScad::builder()
            .summary(r#"{"geometry": {"dimensions": 3, "facets": 6}}"#)
            .build()
            .unwrap();
        let renderer = renderer_for(&fake, 10);

        let response = renderer
            .summary(&SummaryRequest::new("cube([10,10,10]);", SummaryKind::Geometry))
            .await
            .unwrap();
        assert!(response.summary.contains_key("geometry"));

        let args = fake.recorded_args();
        assert_eq!(&args[0..2], &["--summary".to_string(), "geometry".to_string()]);
        assert!(args[3].ends_with("/summary.json"));
        assert!(args[5].ends_with("/dummy.stl"));
        assert_eq!(fake.staging_dirs_left(), 0);
    }

    #[tokio::test]
    async fn test_summary_invalid_json_is_parse_error() {
        let fake = FakeOpenScad::builder().summary("{ not json").build().unwrap();
        let renderer = renderer_for(&fake, 10);

        let err = renderer
            .summary(&SummaryRequest::new("cube(1);", SummaryKind::All))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_validate_runs_version() {
        let fake = FakeOpenScad::builder().stderr("OpenSCAD version 2021.01").build().unwrap();
        let renderer = renderer_for(&fake, 10);

        renderer.validate().await.unwrap();
        assert_eq!(fake.recorded_args(), vec!["--version".to_string()]);
    }

    #[tokio::test]
    async fn test_validate_missing_binary_fails() {
        let root = tempfile::TempDir::new().unwrap();
        let renderer = OpenScadRenderer::new(
            RendererConfig::with_binary("/nonexistent/openscad").with_temp_dir(root.path()),
        );
        assert!(renderer.validate().await.is_err());
    }
}
