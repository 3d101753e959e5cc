//! Spec repository — package metadata lookup for the resolver.
//!
//! A spec repository is a flat directory: one `<name>.yaml` file per
//! package, a `conf.yaml` holding at minimum the repository `api_version`,
//! and an optional `prolog.yaml` whose entries become repository-wide
//! context visible alongside every package spec. Everything is loaded once
//! per run; the repository is handed immutably to the resolver.

use crate::core::types::ResolveError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File names reserved for repository configuration, never package specs.
const RESERVED_SPECS: [&str; 2] = ["conf", "prolog"];

/// A capability a package spec may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Download,
    Build,
    Install,
    Test,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Build => write!(f, "build"),
            Self::Install => write!(f, "install"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Declarative record for one package, loaded from `<name>.yaml`.
///
/// Dependency lists keep their declared order — the resolver uses it as
/// the deterministic tie-break order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSpec {
    #[serde(default)]
    pub primitives: Vec<Primitive>,

    #[serde(default)]
    pub build_deps: Vec<String>,

    #[serde(default)]
    pub install_deps: Vec<String>,

    #[serde(default)]
    pub test_deps: Vec<String>,

    /// Source packages a test run checks out and installs first.
    #[serde(default)]
    pub source_packages: Vec<String>,
}

impl PackageSpec {
    pub fn has_primitive(&self, primitive: Primitive) -> bool {
        self.primitives.contains(&primitive)
    }

    /// Dependency list for one primitive. Download actions expand nothing.
    pub fn dependencies(&self, primitive: Primitive) -> &[String] {
        match primitive {
            Primitive::Build => &self.build_deps,
            Primitive::Install => &self.install_deps,
            Primitive::Test => &self.test_deps,
            Primitive::Download => &[],
        }
    }
}

/// `conf.yaml` — required repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RepoConf {
    api_version: String,
}

/// `prolog.yaml` — optional repository-wide context entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrologFile {
    #[serde(default)]
    vars: IndexMap<String, String>,
}

/// Read-only repository context assembled before any package spec is used.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub api_version: String,
    pub vars: IndexMap<String, String>,
}

/// An immutable, fully loaded spec repository.
#[derive(Debug, Clone)]
pub struct SpecRepo {
    spec_dir: PathBuf,
    context: RepoContext,
    packages: IndexMap<String, PackageSpec>,
}

impl SpecRepo {
    /// Load every package spec from a repository directory.
    ///
    /// `conf.yaml` must exist and declare `api_version`. `prolog.yaml`, if
    /// present, is merged into the context first. Package files load in
    /// sorted name order so the repository is identical across runs.
    pub fn load(spec_dir: &Path) -> Result<Self, String> {
        let conf_path = spec_dir.join("conf.yaml");
        let conf_raw = std::fs::read_to_string(&conf_path)
            .map_err(|e| format!("cannot read {}: {}", conf_path.display(), e))?;
        let conf: RepoConf = serde_yaml_ng::from_str(&conf_raw)
            .map_err(|e| format!("invalid {}: {}", conf_path.display(), e))?;

        let prolog_path = spec_dir.join("prolog.yaml");
        let prolog = if prolog_path.is_file() {
            let raw = std::fs::read_to_string(&prolog_path)
                .map_err(|e| format!("cannot read {}: {}", prolog_path.display(), e))?;
            serde_yaml_ng::from_str::<PrologFile>(&raw)
                .map_err(|e| format!("invalid {}: {}", prolog_path.display(), e))?
        } else {
            PrologFile::default()
        };

        let mut names = Vec::new();
        let entries = std::fs::read_dir(spec_dir)
            .map_err(|e| format!("cannot read spec dir {}: {}", spec_dir.display(), e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if RESERVED_SPECS.contains(&stem) {
                continue;
            }
            names.push(stem.to_string());
        }
        names.sort();

        let mut packages = IndexMap::new();
        for name in names {
            let path = spec_dir.join(format!("{}.yaml", name));
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let spec: PackageSpec = serde_yaml_ng::from_str(&raw)
                .map_err(|e| format!("invalid spec {}: {}", path.display(), e))?;
            packages.insert(name, spec);
        }

        Ok(Self {
            spec_dir: spec_dir.to_path_buf(),
            context: RepoContext {
                api_version: conf.api_version,
                vars: prolog.vars,
            },
            packages,
        })
    }

    /// Look up one package. Fails when no spec file defines the name.
    pub fn lookup(&self, name: &str) -> Result<&PackageSpec, ResolveError> {
        self.packages
            .get(name)
            .ok_or_else(|| ResolveError::UnknownPackage(name.to_string()))
    }

    pub fn context(&self) -> &RepoContext {
        &self.context
    }

    pub fn spec_dir(&self) -> &Path {
        &self.spec_dir
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
