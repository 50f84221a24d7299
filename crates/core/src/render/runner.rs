//! Staging and execution of the external renderer process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::config::RendererConfig;
use super::error::RenderError;
use crate::metrics::OPENSCAD_TIMEOUTS;

/// Name of the script file written into every staging area.
pub const INPUT_FILE_NAME: &str = "input.scad";

/// Outcome of one process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    /// Interleaved stdout and stderr.
    pub output: String,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Temporary directory owned by a single export or summary call.
///
/// The directory and everything in it is removed when the value is dropped.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl StagingArea {
    /// Creates a uniquely named directory under `parent`.
    pub fn create(parent: &Path, prefix: &str) -> Result<Self, RenderError> {
        std::fs::create_dir_all(parent).map_err(|e| {
            RenderError::staging(
                format!("failed to create temp root {}", parent.display()),
                e,
            )
        })?;

        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| RenderError::staging("failed to create temp directory", e))?;

        let path = dir.path().to_path_buf();
        debug!("Created staging directory {}", path.display());

        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the staging area.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Writes the script verbatim and returns its path.
    pub async fn write_input(&self, content: &str) -> Result<PathBuf, RenderError> {
        let input = self.join(INPUT_FILE_NAME);
        tokio::fs::write(&input, content)
            .await
            .map_err(|e| RenderError::staging("failed to write SCAD file", e))?;
        Ok(input)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!("Removed staging directory {}", self.path.display()),
            Err(e) => warn!(
                "Failed to remove staging directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Runs the renderer binary with a hard deadline.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    timeout: Duration,
    temp_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(&config.binary, config.timeout(), &config.temp_dir)
    }

    /// Runs the program in `cwd` and waits for it, killing it at the deadline.
    ///
    /// Only a failure to spawn or wait is returned as an error; non-zero exit
    /// and timeouts are reported through [`ExecutionResult`].
    pub async fn run(&self, args: &[String], cwd: &Path) -> Result<ExecutionResult, RenderError> {
        debug!("Running {} {:?} (dir: {})", self.program.display(), args, cwd.display());

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::process_failed(
                    format!("failed to start {}: {}", self.program.display(), e),
                    "",
                )
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(RenderError::process_failed("output pipes were not captured", ""));
        };

        let result = timeout(self.timeout, async {
            let output = collect_output(stdout, stderr).await;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, output))
        })
        .await;

        match result {
            Ok(Ok((status, output))) => {
                debug!(
                    "Combined output (exit code {:?}):\n{}",
                    status.code(),
                    output
                );
                Ok(ExecutionResult {
                    exit_code: status.code(),
                    output,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(RenderError::process_failed(
                format!("failed to wait for {}: {}", self.program.display(), e),
                "",
            )),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out process: {}", e);
                }
                OPENSCAD_TIMEOUTS.inc();
                warn!(
                    "{} timed out after {:?}",
                    self.program.display(),
                    self.timeout
                );
                Ok(ExecutionResult {
                    exit_code: None,
                    output: String::new(),
                    timed_out: true,
                })
            }
        }
    }

    /// Turns an unsuccessful result into the matching error.
    pub fn check(&self, result: ExecutionResult) -> Result<ExecutionResult, RenderError> {
        if result.timed_out {
            return Err(RenderError::DeadlineExceeded {
                timeout: self.timeout,
            });
        }
        match result.exit_code {
            Some(0) => Ok(result),
            Some(code) => Err(RenderError::process_failed(
                format!("exit status {}", code),
                result.output,
            )),
            None => Err(RenderError::process_failed(
                "terminated by signal",
                result.output,
            )),
        }
    }

    /// Stages `content`, runs the program, and reads back the artifact.
    ///
    /// `build_args` receives the staging area and the input path and returns
    /// the full argument list plus the path of the file to read afterwards.
    /// The staging area is removed on every return path.
    pub async fn stage_and_run<F>(
        &self,
        prefix: &str,
        content: &str,
        build_args: F,
    ) -> Result<Vec<u8>, RenderError>
    where
        F: FnOnce(&StagingArea, &Path) -> (Vec<String>, PathBuf),
    {
        let staging = StagingArea::create(&self.temp_dir, prefix)?;
        let input = staging.write_input(content).await?;
        let (args, artifact) = build_args(&staging, &input);

        let result = self.run(&args, staging.path()).await?;
        self.check(result)?;

        let data = tokio::fs::read(&artifact)
            .await
            .map_err(|source| RenderError::ReadFailed {
                path: artifact.clone(),
                source,
            })?;
        debug!("Read {} ({} bytes)", artifact.display(), data.len());

        Ok(data)
    }
}

/// Reads stdout and stderr concurrently into one buffer, in arrival order.
///
/// Both pipes are drained to EOF as raw bytes so a chatty child never blocks
/// on a full pipe; the text is decoded once at the end.
async fn collect_output(stdout: ChildStdout, stderr: ChildStderr) -> String {
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    // partial lines survive a cancelled read_until in these buffers
    let mut stdout_line = Vec::new();
    let mut stderr_line = Vec::new();
    let mut stdout_open = true;
    let mut stderr_open = true;
    let mut combined = Vec::new();

    loop {
        tokio::select! {
            read = stdout.read_until(b'\n', &mut stdout_line), if stdout_open => {
                if !matches!(read, Ok(n) if n > 0) {
                    stdout_open = false;
                }
                combined.append(&mut stdout_line);
            }
            read = stderr.read_until(b'\n', &mut stderr_line), if stderr_open => {
                if !matches!(read, Ok(n) if n > 0) {
                    stderr_open = false;
                }
                combined.append(&mut stderr_line);
            }
            else => break,
        }
    }

    String::from_utf8_lossy(&combined).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh_runner(root: &TempDir, timeout: Duration) -> ProcessRunner {
        ProcessRunner::new("/bin/sh", timeout, root.path())
    }

    fn script(cmd: &str) -> Vec<String> {
        vec!["-c".to_string(), cmd.to_string()]
    }

    #[tokio::test]
    async fn test_run_success_captures_output() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));

        let result = runner
            .run(&script("echo hello"), root.path())
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output, "hello\n");
    }

    #[tokio::test]
    async fn test_run_merges_stdout_and_stderr() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));

        let result = runner
            .run(&script("echo to-stdout; echo to-stderr 1>&2; exit 3"), root.path())
            .await
            .unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert!(result.output.contains("to-stdout"));
        assert!(result.output.contains("to-stderr"));

        let err = runner.check(result).unwrap_err();
        match err {
            RenderError::ProcessFailed { reason, output } => {
                assert_eq!(reason, "exit status 3");
                assert!(output.contains("to-stderr"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_spawn_failure() {
        let root = TempDir::new().unwrap();
        let runner = ProcessRunner::new(
            "/nonexistent/openscad",
            Duration::from_secs(1),
            root.path(),
        );

        let err = runner.run(&[], root.path()).await.unwrap_err();
        assert!(matches!(err, RenderError::ProcessFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_timeout_kills_process() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_millis(200));

        let started = std::time::Instant::now();
        let result = runner.run(&script("sleep 10"), root.path()).await.unwrap();
        assert!(result.timed_out);
        assert!(started.elapsed() < Duration::from_secs(5));

        let err = runner.check(result).unwrap_err();
        assert!(matches!(err, RenderError::DeadlineExceeded { .. }));
        assert_eq!(err.to_string(), "openscad command timed out after 200ms");
    }

    #[tokio::test]
    async fn test_run_drains_non_utf8_output() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(3));

        // Latin-1 byte, then far more than a pipe buffer holds
        let result = runner
            .run(
                &script(
                    "printf 'caf\\351\\n'; head -c 262144 /dev/zero | tr '\\0' a; \
                     echo done 1>&2; exit 0",
                ),
                root.path(),
            )
            .await
            .unwrap();
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.starts_with("caf\u{FFFD}\n"));
        assert!(result.output.contains("done"));
        assert!(result.output.len() > 262_144);
    }

    #[tokio::test]
    async fn test_run_keeps_line_endings() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));

        let result = runner
            .run(&script("printf 'a\\r\\nb'"), root.path())
            .await
            .unwrap();
        assert_eq!(result.output, "a\r\nb");
    }

    #[tokio::test]
    async fn test_stage_and_run_reads_artifact() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));
        let mut staged = None;

        let data = runner
            .stage_and_run("scad-test-", "cube([1,1,1]);", |staging, input| {
                staged = Some(staging.path().to_path_buf());
                assert_eq!(input, staging.join(INPUT_FILE_NAME));
                // relative paths resolve inside the staging area
                (script("cp input.scad output.txt"), staging.join("output.txt"))
            })
            .await
            .unwrap();

        assert_eq!(data, b"cube([1,1,1]);");
        let staged = staged.unwrap();
        assert!(staged.starts_with(root.path()));
        assert!(!staged.exists(), "staging directory should be removed");
    }

    #[tokio::test]
    async fn test_stage_and_run_missing_output_is_read_failure() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));
        let mut staged = None;

        let err = runner
            .stage_and_run("scad-test-", "cube(1);", |staging, _input| {
                staged = Some(staging.path().to_path_buf());
                (script("true"), staging.join("never-written.stl"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::ReadFailed { .. }));
        assert!(!staged.unwrap().exists());
    }

    #[tokio::test]
    async fn test_stage_and_run_failure_cleans_up() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_secs(10));
        let mut staged = None;

        let err = runner
            .stage_and_run("scad-test-", "cube(1);", |staging, _input| {
                staged = Some(staging.path().to_path_buf());
                (
                    script("echo 'ERROR: Parser error' 1>&2; touch out.stl; exit 1"),
                    staging.join("out.stl"),
                )
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::ProcessFailed { .. }));
        assert!(err.to_string().contains("Parser error"));
        assert!(!staged.unwrap().exists());
    }

    #[tokio::test]
    async fn test_stage_and_run_timeout_cleans_up() {
        let root = TempDir::new().unwrap();
        let runner = sh_runner(&root, Duration::from_millis(200));
        let mut staged = None;

        let err = runner
            .stage_and_run("scad-test-", "cube(1);", |staging, _input| {
                staged = Some(staging.path().to_path_buf());
                (script("sleep 10; touch out.png"), staging.join("out.png"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::DeadlineExceeded { .. }));
        assert!(!staged.unwrap().exists());
    }

    #[tokio::test]
    async fn test_staging_areas_are_unique() {
        let root = TempDir::new().unwrap();
        let first = StagingArea::create(root.path(), "scad-export-").unwrap();
        let second = StagingArea::create(root.path(), "scad-export-").unwrap();
        assert_ne!(first.path(), second.path());

        let input = first.write_input("sphere(2);").await.unwrap();
        assert_eq!(std::fs::read_to_string(input).unwrap(), "sphere(2);");

        let path = first.path().to_path_buf();
        drop(first);
        assert!(!path.exists());
        assert!(second.path().exists());
    }

    #[test]
    fn test_staging_creation_failure() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();

        let err = StagingArea::create(&file, "scad-export-").unwrap_err();
        assert!(matches!(err, RenderError::Staging { .. }));
    }
}
