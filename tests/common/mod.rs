//! Shared test infrastructure for integration tests.
//!
//! Runs the generator binary inside a temporary workspace with stand-in
//! `curl`, `git`, and `pub` scripts on PATH, so no network or Dart SDK is
//! needed.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

pub const STAGING_DIR: &str = "googleapis-discovery-documents";
pub const TOOLKIT_DIR: &str = "discoveryapis_generator";

// Scripts written while another test thread forks can be busy at exec time
// (ETXTBSY); fixtures are built and run one at a time.
static FIXTURE_LOCK: Mutex<()> = Mutex::new(());

/// Which stand-in tool should exit non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailingTool {
    None,
    Curl,
    Git,
    Pub,
    Generator,
}

pub struct Fixture {
    _guard: MutexGuard<'static, ()>,
    temp: TempDir,
}

impl Fixture {
    pub fn new(failing: FailingTool) -> Self {
        let guard = FIXTURE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let temp = TempDir::new().expect("create temp dir");
        let fixture = Self {
            _guard: guard,
            temp,
        };
        fs::create_dir(fixture.work_dir()).expect("create work dir");
        fs::create_dir(fixture.bin_dir()).expect("create bin dir");
        fixture.install_tools(failing);
        fixture
    }

    pub fn work_dir(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.temp.path().join("bin")
    }

    /// File the stand-in generator writes its arguments to, one per line.
    pub fn generator_log(&self) -> PathBuf {
        self.temp.path().join("generator-args.log")
    }

    /// File the stand-in tools append their invocation order to.
    pub fn calls_log(&self) -> PathBuf {
        self.temp.path().join("calls.log")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.work_dir().join(STAGING_DIR)
    }

    pub fn toolkit_dir(&self) -> PathBuf {
        self.work_dir().join(TOOLKIT_DIR)
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let path = format!(
            "{}:{}",
            self.bin_dir().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        Command::new(env!("CARGO_BIN_EXE_discovery_dart_generator"))
            .args(args)
            .current_dir(self.work_dir())
            .env("PATH", path)
            .env_remove("RUST_LOG")
            .env_remove("DISCOVERY_GEN_TOOLKIT_REPO")
            .env_remove("DISCOVERY_GEN_PUB_COMMAND")
            .env_remove("DISCOVERY_GEN_GENERATOR_COMMAND")
            .output()
            .expect("run generator binary")
    }

    pub fn generator_args(&self) -> Vec<String> {
        fs::read_to_string(self.generator_log())
            .expect("generator was invoked")
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.calls_log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn scratch_removed(&self) -> bool {
        !self.staging_dir().exists() && !self.toolkit_dir().exists()
    }

    fn install_tools(&self, failing: FailingTool) {
        let calls = self.calls_log();
        let generator_log = self.generator_log();
        let exit_for = |tool: FailingTool| {
            if failing == tool {
                "echo \"simulated failure\" >&2\nexit 7"
            } else {
                ":"
            }
        };

        // curl ... -o <dest> <url>
        let curl = format!(
            "echo curl >> '{calls}'\n{fail}\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then shift; dest=\"$1\"; fi\n  shift\ndone\necho '{{}}' > \"$dest\"",
            calls = calls.display(),
            fail = exit_for(FailingTool::Curl),
        );
        let generator = format!(
            "#!/bin/sh\necho generate >> '{calls}'\nfor arg in \"$@\"; do echo \"$arg\" >> '{log}'; done\n{fail}\n",
            calls = calls.display(),
            log = generator_log.display(),
            fail = exit_for(FailingTool::Generator),
        );
        // git clone <repo> <dest>, creating the toolkit with its entry point
        let git = format!(
            "echo git >> '{calls}'\ndest=\"$3\"\nmkdir -p \"$dest/bin\"\ncat > \"$dest/bin/generate.dart\" <<'EOF'\n{generator}EOF\nchmod +x \"$dest/bin/generate.dart\"\n{fail}",
            calls = calls.display(),
            fail = exit_for(FailingTool::Git),
        );
        let pub_tool = format!(
            "echo \"pub $(basename \"$PWD\")\" >> '{calls}'\n{fail}",
            calls = calls.display(),
            fail = exit_for(FailingTool::Pub),
        );

        write_script(&self.bin_dir().join("curl"), &curl);
        write_script(&self.bin_dir().join("git"), &git);
        write_script(&self.bin_dir().join("pub"), &pub_tool);
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = fs::metadata(path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
