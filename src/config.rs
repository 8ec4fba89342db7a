//! Run configuration and toolchain overrides.
//!
//! `RunConfig` is built once from parsed arguments and is the only way the
//! pipeline learns what to generate. Construction rejects invalid input, so a
//! `RunConfig` in hand is always runnable.
use crate::cli::RootArgs;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::str::FromStr;

pub const TOOLKIT_REPO_ENV: &str = "DISCOVERY_GEN_TOOLKIT_REPO";
pub const PUB_COMMAND_ENV: &str = "DISCOVERY_GEN_PUB_COMMAND";
pub const GENERATOR_COMMAND_ENV: &str = "DISCOVERY_GEN_GENERATOR_COMMAND";

pub const DEFAULT_TOOLKIT_REPO: &str = "https://github.com/dart-lang/discoveryapis_generator.git";
pub const DEFAULT_PUB_COMMAND: &str = "pub get";
pub const DEFAULT_GENERATOR_COMMAND: &str = "bin/generate.dart";

/// Generation mode passed through to the generator entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Create a new package with metadata.
    Package,
    /// Update the files of an existing package in place.
    Files,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Package => "package",
            Mode::Files => "files",
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "package" => Ok(Mode::Package),
            "files" => Ok(Mode::Files),
            other => Err(anyhow!(
                "invalid mode {other:?} (expected \"package\" or \"files\")"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a newly created package. Only used in package mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: Option<String>,
    pub homepage: Option<String>,
}

/// Immutable configuration for a single generator run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    pub source_url: String,
    pub output_dir: String,
    pub package: PackageMetadata,
    pub update_pubspec: bool,
}

impl RunConfig {
    /// Validate parsed arguments into a runnable config.
    pub fn from_args(args: &RootArgs) -> Result<Self> {
        let mode: Mode = args.mode.parse()?;
        let source_url = args.url.trim();
        if source_url.is_empty() {
            return Err(anyhow!("--url is required"));
        }
        Ok(Self {
            mode,
            source_url: source_url.to_string(),
            output_dir: args.output.clone(),
            package: PackageMetadata {
                name: args.package_name.clone(),
                version: args.package_version.clone(),
                description: args.package_description.clone(),
                author: non_empty(&args.package_author),
                homepage: non_empty(&args.package_homepage),
            },
            update_pubspec: args.update_pubspec,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// External commands the process-backed executor runs.
///
/// Defaults target the classic Dart SDK layout; each can be overridden from
/// the environment (e.g. `DISCOVERY_GEN_PUB_COMMAND="dart pub get"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    pub toolkit_repo: String,
    pub pub_command: Vec<String>,
    pub generator_command: Vec<String>,
}

impl Toolchain {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a toolchain from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let toolkit_repo =
            value(TOOLKIT_REPO_ENV).unwrap_or_else(|| DEFAULT_TOOLKIT_REPO.to_string());
        let pub_command = split_command(
            PUB_COMMAND_ENV,
            value(PUB_COMMAND_ENV).as_deref().unwrap_or(DEFAULT_PUB_COMMAND),
        )?;
        let generator_command = split_command(
            GENERATOR_COMMAND_ENV,
            value(GENERATOR_COMMAND_ENV)
                .as_deref()
                .unwrap_or(DEFAULT_GENERATOR_COMMAND),
        )?;
        Ok(Self {
            toolkit_repo,
            pub_command,
            generator_command,
        })
    }
}

fn split_command(key: &str, command: &str) -> Result<Vec<String>> {
    let words = shell_words::split(command).with_context(|| format!("parse {key}: {command}"))?;
    if words.is_empty() {
        return Err(anyhow!("{key} is empty"));
    }
    Ok(words)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
