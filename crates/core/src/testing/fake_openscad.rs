//! Stand-in openscad executable for process-level tests.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::render::RendererConfig;

/// A shell script that behaves like openscad closely enough for the runner.
///
/// It records its arguments, optionally sleeps, prints to stderr, copies a
/// fixture to the `-o` path and another to the `--summary-file` path, then
/// exits with the configured code. Everything lives in a temp directory that
/// also hosts the staging root, so leftover staging directories can be
/// counted.
///
/// # Example
///
/// ```rust,ignore
/// use scadsrv_core::testing::FakeOpenScad;
///
/// let fake = FakeOpenScad::builder().output(png_bytes).build()?;
/// let renderer = OpenScadRenderer::new(fake.config());
/// ```
#[derive(Debug)]
pub struct FakeOpenScad {
    _root: TempDir,
    binary: PathBuf,
    args_log: PathBuf,
    staging_root: PathBuf,
}

/// Builder for [`FakeOpenScad`].
#[derive(Debug, Default)]
pub struct FakeOpenScadBuilder {
    output: Option<Vec<u8>>,
    summary: Option<String>,
    stderr: Option<String>,
    exit_code: i32,
    sleep_secs: Option<u64>,
}

impl FakeOpenScadBuilder {
    /// Bytes written to the `-o` path.
    pub fn output(mut self, data: Vec<u8>) -> Self {
        self.output = Some(data);
        self
    }

    /// JSON written to the `--summary-file` path.
    pub fn summary(mut self, json: impl Into<String>) -> Self {
        self.summary = Some(json.into());
        self
    }

    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = Some(text.into());
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn sleep_secs(mut self, secs: u64) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    /// Writes the script and its fixtures.
    pub fn build(self) -> io::Result<FakeOpenScad> {
        let root = TempDir::new()?;
        let binary = root.path().join("openscad");
        let args_log = root.path().join("args.log");
        let staging_root = root.path().join("staging");
        fs::create_dir(&staging_root)?;

        let mut script = format!(
            r#"#!/bin/sh
printf '%s\n' "$@" > '{log}'
out=""
summary=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --summary-file) summary="$2"; shift 2 ;;
    *) shift ;;
  esac
done
"#,
            log = args_log.display()
        );

        if let Some(secs) = self.sleep_secs {
            script.push_str(&format!("sleep {}\n", secs));
        }
        if let Some(text) = &self.stderr {
            let path = write_fixture(root.path(), "stderr.txt", text.as_bytes())?;
            script.push_str(&format!("cat '{}' 1>&2\n", path.display()));
        }
        if let Some(data) = &self.output {
            let path = write_fixture(root.path(), "output.bin", data)?;
            script.push_str(&format!(
                "if [ -n \"$out\" ]; then cp '{}' \"$out\"; fi\n",
                path.display()
            ));
        }
        if let Some(json) = &self.summary {
            let path = write_fixture(root.path(), "summary.json", json.as_bytes())?;
            script.push_str(&format!(
                "if [ -n \"$summary\" ]; then cp '{}' \"$summary\"; fi\n",
                path.display()
            ));
        }
        script.push_str(&format!("exit {}\n", self.exit_code));

        fs::write(&binary, script)?;
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))?;

        Ok(FakeOpenScad {
            _root: root,
            binary,
            args_log,
            staging_root,
        })
    }
}

fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, data)?;
    Ok(path)
}

impl FakeOpenScad {
    pub fn builder() -> FakeOpenScadBuilder {
        FakeOpenScadBuilder::default()
    }

    /// Path of the executable script.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Directory used as the renderer's temp dir.
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Renderer config pointing at this binary and staging root.
    pub fn config(&self) -> RendererConfig {
        RendererConfig::with_binary(&self.binary).with_temp_dir(&self.staging_root)
    }

    /// Arguments of the most recent invocation, one per entry.
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(&self.args_log)
            .map(|log| log.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Number of entries still present under the staging root.
    pub fn staging_dirs_left(&self) -> usize {
        fs::read_dir(&self.staging_root)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
