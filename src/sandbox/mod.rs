//! Sandbox lifecycle — the isolated directory tree build sessions run in.
//!
//! A sandbox is a root directory owning a fixed set of subdirectories plus
//! a metadata file under `meta/` that doubles as the sandbox marker. It is
//! created once and reused by every exec against the same root until the
//! caller deletes it.

pub mod exec;

use crate::vcs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The fixed subdirectory set; presence of all eight is the structure
/// signature `load` checks.
pub const SANDBOX_DIRS: [&str; 8] = ["bin", "log", "meta", "patch", "specs", "src", "tmp", "vcs"];

/// Build-tool project-search-path variables scrubbed from the execution
/// environment so the invoking shell cannot leak into sandboxed builds.
pub const SCRUBBED_ENV_VARS: [&str; 2] = ["GPR_PROJECT_PATH", "ADA_PROJECT_PATH"];

const META_FILE: &str = "sandbox.yaml";

/// Where a sandbox gets its spec files from at create time.
#[derive(Debug, Clone)]
pub enum SpecSource {
    /// Copy spec files from a local directory.
    Local(PathBuf),
    /// Clone a spec repository and copy its files in.
    Git(String),
}

/// Sandbox failure modes. All are detected before any action executes.
#[derive(Debug)]
pub enum SandboxError {
    AlreadyExists(PathBuf),
    NotASandbox(PathBuf),
    SpecDirMissing(PathBuf),
    PlanFileMissing(PathBuf),
    Io(String),
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists(root) => {
                write!(f, "sandbox already exists at {}", root.display())
            }
            Self::NotASandbox(root) => write!(f, "{} is not a sandbox", root.display()),
            Self::SpecDirMissing(dir) => {
                write!(f, "spec directory {} does not exist", dir.display())
            }
            Self::PlanFileMissing(plan) => {
                write!(f, "plan file {} does not exist", plan.display())
            }
            Self::Io(msg) => write!(f, "{}", msg),
        }
    }
}

/// Metadata persisted under `meta/sandbox.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxMeta {
    pub schema: String,
    pub root: PathBuf,
}

/// A provisioned sandbox rooted at a user-chosen path.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a new sandbox at `root`, materializing `specs/` from the
    /// given source. Fails if `root` already holds a sandbox marker.
    pub fn create(root: &Path, source: Option<&SpecSource>) -> Result<Self, SandboxError> {
        if root.join("meta").join(META_FILE).exists() {
            return Err(SandboxError::AlreadyExists(root.to_path_buf()));
        }

        for dir in SANDBOX_DIRS {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| {
                SandboxError::Io(format!("cannot create {}: {}", path.display(), e))
            })?;
        }

        let sandbox = Self {
            root: root.to_path_buf(),
        };
        if let Some(source) = source {
            sandbox.materialize_specs(source)?;
        }
        sandbox.write_meta()?;
        Ok(sandbox)
    }

    /// Open an existing sandbox. Fails unless the full subdirectory set
    /// is present.
    pub fn load(root: &Path) -> Result<Self, SandboxError> {
        for dir in SANDBOX_DIRS {
            if !root.join(dir).is_dir() {
                return Err(SandboxError::NotASandbox(root.to_path_buf()));
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subdir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn spec_dir(&self) -> PathBuf {
        self.subdir("specs")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.subdir("log")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.subdir("meta").join(META_FILE)
    }

    pub fn read_meta(&self) -> Result<SandboxMeta, SandboxError> {
        let path = self.meta_path();
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| SandboxError::Io(format!("cannot read {}: {}", path.display(), e)))?;
        serde_yaml_ng::from_str(&raw)
            .map_err(|e| SandboxError::Io(format!("invalid {}: {}", path.display(), e)))
    }

    /// Refresh `specs/` from a source after creation (exec may point an
    /// existing sandbox at a new spec repository).
    pub fn materialize_specs(&self, source: &SpecSource) -> Result<(), SandboxError> {
        match source {
            SpecSource::Local(dir) => {
                if !dir.is_dir() {
                    return Err(SandboxError::SpecDirMissing(dir.clone()));
                }
                copy_spec_files(dir, &self.spec_dir())
            }
            SpecSource::Git(url) => {
                let checkout = self.subdir("vcs").join("specs");
                vcs::checkout(url, &checkout).map_err(SandboxError::Io)?;
                copy_spec_files(&checkout, &self.spec_dir())
            }
        }
    }

    /// A normalized environment snapshot for executing actions.
    ///
    /// Project-search-path variables of the wrapped build toolchain are
    /// reset to empty so the invoking shell's configuration cannot
    /// cross-contaminate sandboxed builds. Returned as a mapping — the
    /// true process environment is never mutated.
    pub fn default_env(&self) -> IndexMap<String, String> {
        let mut env: IndexMap<String, String> = std::env::vars().collect();
        for var in SCRUBBED_ENV_VARS {
            env.insert(var.to_string(), String::new());
        }
        env
    }

    /// Write the sandbox marker atomically (temp file + rename).
    fn write_meta(&self) -> Result<(), SandboxError> {
        let meta = SandboxMeta {
            schema: "1.0".to_string(),
            root: self.root.clone(),
        };
        let yaml = serde_yaml_ng::to_string(&meta)
            .map_err(|e| SandboxError::Io(format!("serialize error: {}", e)))?;

        let path = self.meta_path();
        let tmp_path = path.with_extension("yaml.tmp");
        std::fs::write(&tmp_path, &yaml)
            .map_err(|e| SandboxError::Io(format!("cannot write {}: {}", tmp_path.display(), e)))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            SandboxError::Io(format!(
                "cannot rename {} -> {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

/// Copy the flat spec-file set from one directory into another. Dotfiles
/// and subdirectories (a checkout's `.git`, for instance) stay behind.
fn copy_spec_files(from: &Path, to: &Path) -> Result<(), SandboxError> {
    let entries = std::fs::read_dir(from)
        .map_err(|e| SandboxError::Io(format!("cannot read {}: {}", from.display(), e)))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let dest = to.join(&name);
        std::fs::copy(&path, &dest).map_err(|e| {
            SandboxError::Io(format!(
                "cannot copy {} -> {}: {}",
                path.display(),
                dest.display(),
                e
            ))
        })?;
    }
    Ok(())
}
