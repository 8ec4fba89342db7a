//! The generator run: an ordered list of steps with unconditional cleanup.
//!
//! Each step either succeeds and gates the next, or produces a
//! [`StepFailure`] that ends the run. Cleanup always runs afterwards, and the
//! resulting [`RunOutcome`] is the only thing that decides the exit status.
use crate::config::{Mode, RunConfig};
use crate::executor::Executor;
use crate::workspace::{Workspace, STAGING_DIR};
use std::fmt;
use std::path::Path;

/// Pipeline steps that can fail after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    PrepareWorkspace,
    FetchDocument,
    CloneToolkit,
    InstallDependencies,
    Generate,
}

impl Step {
    /// Progress line printed before the step runs.
    fn progress(self) -> Option<&'static str> {
        match self {
            Step::PrepareWorkspace => None,
            Step::FetchDocument => Some("Downloading discovery documents..."),
            Step::CloneToolkit => Some("Getting dart generator libraries..."),
            Step::InstallDependencies => Some("Building generator libraries..."),
            Step::Generate => Some("Generating dart client library files..."),
        }
    }

    /// User-facing explanation of a failure in this step.
    pub fn hint(self) -> &'static str {
        match self {
            Step::PrepareWorkspace => {
                "Error creating directory. Make sure you have write permission."
            }
            Step::FetchDocument => {
                "Error downloading discovery documents.\nMake sure you're using a valid URL."
            }
            Step::CloneToolkit => {
                "Error downloading the dart discovery api generator library.\nThe repository URL might have changed, please file a bug."
            }
            Step::InstallDependencies => {
                "Error building dart libraries.\nMake sure you have Dart installed and can run 'pub' on the command line."
            }
            Step::Generate => "Error generating client libraries.",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::PrepareWorkspace => "prepare workspace",
            Step::FetchDocument => "fetch discovery document",
            Step::CloneToolkit => "clone generator toolkit",
            Step::InstallDependencies => "install generator dependencies",
            Step::Generate => "generate",
        };
        f.write_str(name)
    }
}

/// A step that failed, with the underlying error.
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub source: anyhow::Error,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {:#}", self.step, self.source)
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A step failed; cleanup succeeded.
    Failed(Step),
    /// Cleanup failed, whatever happened before it.
    CleanupFailed,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Failed(_) => 1,
            RunOutcome::CleanupFailed => 2,
        }
    }
}

/// Run the whole pipeline for `config` inside `workspace`.
pub fn run<E: Executor>(config: &RunConfig, workspace: &Workspace, executor: &mut E) -> RunOutcome {
    print_banner(config);

    let result = execute_steps(config, workspace, executor);
    if let Err(failure) = &result {
        tracing::warn!(%failure, "step failed");
        println!("{}", failure.step.hint());
        println!("error: {:#}", failure.source);
    }

    println!("Cleaning up...");
    if let Err(err) = workspace.cleanup() {
        println!("Error cleaning up.");
        println!("error: {err:#}");
        return RunOutcome::CleanupFailed;
    }

    match result {
        Ok(()) => {
            println!("Generated client library in {}", config.output_dir);
            RunOutcome::Completed
        }
        Err(failure) => RunOutcome::Failed(failure.step),
    }
}

fn execute_steps<E: Executor>(
    config: &RunConfig,
    workspace: &Workspace,
    executor: &mut E,
) -> Result<(), StepFailure> {
    attempt(Step::PrepareWorkspace, || workspace.prepare())?;
    attempt(Step::FetchDocument, || {
        executor.fetch(&config.source_url, &workspace.document_path())
    })?;
    attempt(Step::CloneToolkit, || {
        executor.clone_toolkit(&workspace.toolkit_dir())
    })?;
    attempt(Step::InstallDependencies, || {
        executor.install_dependencies(&workspace.toolkit_dir())
    })?;
    let args = generator_args(config);
    attempt(Step::Generate, || {
        executor.generate(&workspace.toolkit_dir(), &args)
    })
}

fn attempt<F>(step: Step, action: F) -> Result<(), StepFailure>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    if let Some(progress) = step.progress() {
        println!("{progress}");
    }
    let span = tracing::info_span!("step", step = %step);
    let _guard = span.enter();
    action().map_err(|source| StepFailure { step, source })
}

/// Arguments passed to the generator entry point, mode first.
///
/// The generator runs inside the toolkit directory, so relative paths are
/// given from there.
pub fn generator_args(config: &RunConfig) -> Vec<String> {
    let mut args = vec![config.mode.as_str().to_string()];
    let input_dir = format!("--input-dir=../{STAGING_DIR}");
    let output_dir = format!("--output-dir={}", output_arg(&config.output_dir));
    match config.mode {
        Mode::Package => {
            let package = &config.package;
            args.push(format!("--package-name={}", package.name));
            args.push(format!("--package-version={}", package.version));
            args.push(format!("--package-description={}", package.description));
            args.push(input_dir);
            args.push(output_dir);
            if let Some(author) = &package.author {
                args.push(format!("--package-author={author}"));
            }
            if let Some(homepage) = &package.homepage {
                args.push(format!("--package-homepage={homepage}"));
            }
        }
        Mode::Files => {
            args.push(input_dir);
            args.push(output_dir);
            args.push(format!("--update-pubspec={}", config.update_pubspec));
        }
    }
    args
}

fn output_arg(output_dir: &str) -> String {
    if Path::new(output_dir).is_absolute() {
        output_dir.to_string()
    } else {
        format!("../{output_dir}")
    }
}

fn print_banner(config: &RunConfig) {
    println!("\n**********");
    println!("Starting generator...");
    println!("URL: {}", config.source_url);
    println!("Mode: {}", config.mode);
    println!("Output: {}", config.output_dir);
    match config.mode {
        Mode::Package => {
            let package = &config.package;
            println!("Package: {}", package.name);
            println!("Version: {}", package.version);
            println!("Description: {}", package.description);
            if let Some(author) = &package.author {
                println!("Author: {author}");
            }
            if let Some(homepage) = &package.homepage {
                println!("Homepage: {homepage}");
            }
        }
        Mode::Files => println!("Update pubspec: {}", config.update_pubspec),
    }
    println!();
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
