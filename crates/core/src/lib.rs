pub mod config;
pub mod metrics;
pub mod render;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, LogFormat, LoggingConfig, ServerConfig,
};
pub use render::{
    ExportArtifact, ExportFormat, ExportOptions, ExportRequest, OpenScadRenderer, RenderError,
    Renderer, RendererConfig, SummaryKind, SummaryRequest, SummaryResponse,
};
