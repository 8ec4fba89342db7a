//! CLI argument parsing for the discovery generator.
//!
//! Flags keep the historical names of the tool, including single-dash long
//! forms (`-url`, `-up`), double-dash short forms (`--u`), and `-h`/`-v` as
//! package metadata rather than help/version. [`normalize_args`] rewrites
//! those forms before clap sees them.
use clap::{ArgAction, Parser};
use std::ffi::OsString;

/// Exit status for usage errors and unrecoverable cleanup failures.
pub const USAGE_EXIT_CODE: u8 = 2;

pub const DEFAULT_MODE: &str = "package";
pub const DEFAULT_OUTPUT_DIR: &str = "googleapis";
pub const DEFAULT_PACKAGE_NAME: &str = "googleapis";
pub const DEFAULT_PACKAGE_VERSION: &str = "0.1.0-dev";
pub const DEFAULT_PACKAGE_DESCRIPTION: &str = "Auto-generated client libraries.";

const AFTER_HELP: &str = "\
Modes:
  -m package   Create a new API package (default). Uses --output and all
               --package-* options.
  -m files     Update the files of an existing package. Uses --output and
               --update-pubspec; --package-* options are ignored.

--update-pubspec rewrites pubspec.yaml with the required dependencies. This
removes comments and may change the layout of the file.

Environment:
  DISCOVERY_GEN_TOOLKIT_REPO       Generator repository to clone
  DISCOVERY_GEN_PUB_COMMAND        Dependency command (default: pub get)
  DISCOVERY_GEN_GENERATOR_COMMAND  Generator entry point (default: bin/generate.dart)
  RUST_LOG                         Log filter for diagnostics on stderr

Examples:
  discovery_dart_generator -u https://www.googleapis.com/discovery/v1/apis/drive/v3/rest
  discovery_dart_generator -m files -o ../googleapis -up -u <url>";

/// Root CLI entrypoint.
///
/// Values are kept as plain strings here; [`crate::config::RunConfig`] owns
/// validation so rejected runs never reach the pipeline. Every string option
/// takes the next argument as its value even when it starts with `-`.
#[derive(Parser, Debug)]
#[command(
    name = "discovery_dart_generator",
    about = "Download a discovery document and generate a Dart API package",
    after_help = AFTER_HELP,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct RootArgs {
    /// URL of the discovery document (required)
    #[arg(
        short = 'u',
        long,
        value_name = "URL",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub url: String,

    /// Create (package) or update (files) a package
    #[arg(
        short = 'm',
        long,
        value_name = "MODE",
        default_value = DEFAULT_MODE,
        allow_hyphen_values = true
    )]
    pub mode: String,

    /// Output directory of the generated API package
    #[arg(
        short = 'o',
        long,
        visible_alias = "output-dir",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        allow_hyphen_values = true
    )]
    pub output: String,

    /// Name of the generated API package
    #[arg(
        short = 'p',
        long,
        value_name = "NAME",
        default_value = DEFAULT_PACKAGE_NAME,
        allow_hyphen_values = true
    )]
    pub package_name: String,

    /// Version of the generated API package
    #[arg(
        short = 'v',
        long,
        value_name = "VERSION",
        default_value = DEFAULT_PACKAGE_VERSION,
        allow_hyphen_values = true
    )]
    pub package_version: String,

    /// Description of the generated API package
    #[arg(
        short = 'd',
        long,
        value_name = "TEXT",
        default_value = DEFAULT_PACKAGE_DESCRIPTION,
        allow_hyphen_values = true
    )]
    pub package_description: String,

    /// Author of the generated API package
    #[arg(
        short = 'a',
        long,
        value_name = "AUTHOR",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub package_author: String,

    /// Homepage of the generated API package
    #[arg(
        short = 'h',
        long,
        value_name = "URL",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub package_homepage: String,

    /// Update pubspec.yaml with required dependencies (files mode, short: -up)
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub update_pubspec: bool,

    /// Log each external command to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

/// Long flag names and whether they consume the following argument.
const LONG_FLAGS: &[(&str, bool)] = &[
    ("url", true),
    ("mode", true),
    ("output", true),
    ("output-dir", true),
    ("package-name", true),
    ("package-version", true),
    ("package-description", true),
    ("package-author", true),
    ("package-homepage", true),
    ("update-pubspec", false),
    ("verbose", false),
    ("help", false),
];

/// Shorthands with more than one character.
const MULTI_CHAR_SHORTS: &[(&str, &str)] = &[("up", "update-pubspec")];

/// Single-character flags and their long names. All of them take a value.
const SHORT_FLAGS: &[(&str, &str)] = &[
    ("u", "url"),
    ("m", "mode"),
    ("o", "output"),
    ("p", "package-name"),
    ("v", "package-version"),
    ("d", "package-description"),
    ("a", "package-author"),
    ("h", "package-homepage"),
];

/// Rewrite flags into the spelling clap expects.
///
/// Any flag may be written with one or two dashes (`-url`, `--up`, `--u`).
/// The first element is the program name and is passed through. Arguments
/// that are the value of a preceding flag, and everything after `--`, are
/// left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut iter = args.into_iter().map(Into::into);
    if let Some(program) = iter.next() {
        out.push(program);
    }

    let mut expecting_value = false;
    let mut passthrough = false;
    for arg in iter {
        if passthrough || expecting_value {
            expecting_value = false;
            out.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if text == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let (rewritten, takes_value) = rewrite_flag(text);
        expecting_value = takes_value && !text.contains('=');
        match rewritten {
            Some(flag) => out.push(OsString::from(flag)),
            None => out.push(arg),
        }
    }
    out
}

/// Returns the canonical `--flag[=value]` spelling when `text` needs
/// rewriting, and whether the flag consumes a separate value.
fn rewrite_flag(text: &str) -> (Option<String>, bool) {
    let Some(stripped) = text.strip_prefix('-') else {
        return (None, false);
    };
    let (double_dash, body) = match stripped.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, stripped),
    };
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    };

    if let Some((_, long)) = MULTI_CHAR_SHORTS.iter().find(|(short, _)| *short == name) {
        return (Some(join_flag(long, value)), false);
    }

    if let Some((long, takes_value)) = LONG_FLAGS.iter().find(|(long, _)| *long == name) {
        let rewritten = (!double_dash).then(|| join_flag(long, value));
        return (rewritten, *takes_value);
    }

    if let Some((_, long)) = SHORT_FLAGS.iter().find(|(short, _)| *short == name) {
        // clap reads `-u` itself; `--u` is not a name it knows.
        let rewritten = double_dash.then(|| join_flag(long, value));
        return (rewritten, true);
    }

    (None, false)
}

fn join_flag(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("--{name}={value}"),
        None => format!("--{name}"),
    }
}
