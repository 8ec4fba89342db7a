//! On-disk layout of a generator run.
//!
//! Every run uses the same two scratch directories under the workspace root:
//! the staging directory holding the downloaded discovery document and the
//! cloned generator toolkit. Both are removed when the run ends.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const STAGING_DIR: &str = "googleapis-discovery-documents";
pub const TOOLKIT_DIR: &str = "discoveryapis_generator";
pub const DOCUMENT_FILE: &str = "generated.json";

/// Scratch directory layout rooted at a working directory.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace rooted at the process's current directory.
    pub fn current() -> Result<Self> {
        let root = std::env::current_dir().context("resolve current directory")?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn toolkit_dir(&self) -> PathBuf {
        self.root.join(TOOLKIT_DIR)
    }

    pub fn document_path(&self) -> PathBuf {
        self.staging_dir().join(DOCUMENT_FILE)
    }

    /// Create the staging directory. It must not exist yet.
    pub fn prepare(&self) -> Result<()> {
        let staging = self.staging_dir();
        fs::create_dir(&staging).with_context(|| format!("create {}", staging.display()))?;
        tracing::debug!(path = %staging.display(), "created staging directory");
        Ok(())
    }

    /// Remove the staging and toolkit directories.
    ///
    /// Missing directories are fine. Both removals are attempted; the first
    /// failure is returned.
    pub fn cleanup(&self) -> Result<()> {
        let mut first_err = None;
        for dir in [self.staging_dir(), self.toolkit_dir()] {
            if let Err(err) = remove_dir_if_present(&dir) {
                tracing::warn!(path = %dir.display(), error = %err, "cleanup failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
            tracing::debug!(path = %dir.display(), "removed directory");
            Ok(())
        }
        Ok(_) => {
            // rm -rf semantics: a stray file or symlink in our slot goes too
            fs::remove_file(dir).with_context(|| format!("remove {}", dir.display()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(anyhow!(err).context(format!("inspect {}", dir.display()))),
    }
}
