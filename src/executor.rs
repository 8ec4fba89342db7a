//! External tool invocations used by the pipeline.
//!
//! The pipeline only talks to the [`Executor`] trait; [`SystemExecutor`] is
//! the process-backed implementation and the only place that spawns
//! commands.
use crate::config::Toolchain;
use crate::util::stderr_excerpt;
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// One method per external step of a run.
pub trait Executor {
    /// Download `url` into the file at `dest`.
    fn fetch(&mut self, url: &str, dest: &Path) -> Result<()>;

    /// Materialize a working copy of the generator toolkit at `dest`.
    fn clone_toolkit(&mut self, dest: &Path) -> Result<()>;

    /// Resolve and install the toolkit's dependencies inside `dir`.
    fn install_dependencies(&mut self, dir: &Path) -> Result<()>;

    /// Run the toolkit's generator inside `dir` with `args`.
    fn generate(&mut self, dir: &Path, args: &[String]) -> Result<()>;
}

/// Runs `curl`, `git`, and the toolchain commands as child processes.
pub struct SystemExecutor {
    toolchain: Toolchain,
}

impl SystemExecutor {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }
}

impl Executor for SystemExecutor {
    fn fetch(&mut self, url: &str, dest: &Path) -> Result<()> {
        let args = [
            OsString::from("--silent"),
            OsString::from("--show-error"),
            OsString::from("--fail"),
            OsString::from("--location"),
            OsString::from("-o"),
            dest.as_os_str().to_os_string(),
            OsString::from(url),
        ];
        run_tool("curl", &args, None)
    }

    fn clone_toolkit(&mut self, dest: &Path) -> Result<()> {
        let args = [
            OsString::from("clone"),
            OsString::from(&self.toolchain.toolkit_repo),
            dest.as_os_str().to_os_string(),
        ];
        run_tool("git", &args, None)
    }

    fn install_dependencies(&mut self, dir: &Path) -> Result<()> {
        let (program, rest) = split_program(&self.toolchain.pub_command)?;
        let args: Vec<OsString> = rest.iter().map(OsString::from).collect();
        run_tool(program, &args, Some(dir))
    }

    fn generate(&mut self, dir: &Path, args: &[String]) -> Result<()> {
        let (program, rest) = split_program(&self.toolchain.generator_command)?;
        let args: Vec<OsString> = rest.iter().chain(args).map(OsString::from).collect();
        run_tool(program, &args, Some(dir))
    }
}

fn split_program(command: &[String]) -> Result<(&str, &[String])> {
    command
        .split_first()
        .map(|(program, rest)| (program.as_str(), rest))
        .ok_or_else(|| anyhow!("command is empty"))
}

/// Resolve `program` on PATH (or relative to `cwd` when it contains a path
/// separator) so a missing tool is reported by name.
fn resolve_program(program: &str, cwd: &Path) -> Result<PathBuf> {
    which::which_in(program, std::env::var_os("PATH"), cwd)
        .map_err(|err| anyhow!("{program} not found ({err}); make sure it is installed and on PATH"))
}

fn run_tool(program: &str, args: &[OsString], cwd: Option<&Path>) -> Result<()> {
    let base = match cwd {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let resolved = resolve_program(program, &base)?;
    tracing::debug!(program, resolved = %resolved.display(), ?args, "spawning");

    let start = Instant::now();
    let mut command = Command::new(&resolved);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command
        .output()
        .with_context(|| format!("run {program}"))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::info!(
        tool = program,
        elapsed_ms,
        status = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        "command complete"
    );

    if !output.status.success() {
        let detail = stderr_excerpt(&output);
        return Err(if detail.is_empty() {
            anyhow!("{program} failed: {}", output.status)
        } else {
            anyhow!("{program} failed: {}: {detail}", output.status)
        });
    }
    Ok(())
}
