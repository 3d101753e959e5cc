//! Core types — plan requests, resolved actions, platforms, resolution errors.
//!
//! A plan yields `ActionRequest`s; the resolver expands each into
//! `ResolvedAction` nodes. Two resolved actions with the same
//! (kind, package, platform) triple are the same node.

use serde::Serialize;
use std::fmt;

/// High-level intent kinds a plan may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Build,
    Install,
    Test,
    Download,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Install => write!(f, "install"),
            Self::Test => write!(f, "test"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// One top-level request from a plan document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: RequestKind,
    pub package: String,
}

impl ActionRequest {
    pub fn new(kind: RequestKind, package: &str) -> Self {
        Self {
            kind,
            package: package.to_string(),
        }
    }
}

/// Concrete action kinds produced by resolution.
///
/// Source-handling kinds (DownloadSource, GetSource, InstallSource) are
/// platform-independent; the rest are bound to a target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DownloadBinary,
    DownloadSource,
    GetSource,
    InstallSource,
    Build,
    Install,
    Test,
}

impl ActionKind {
    /// Whether actions of this kind carry a target platform.
    pub fn platform_bound(&self) -> bool {
        !matches!(
            self,
            Self::DownloadSource | Self::GetSource | Self::InstallSource
        )
    }
}

/// A concrete unit of work in the action graph.
///
/// Identity is the full (kind, package, platform) triple — the graph never
/// holds two nodes with the same triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ResolvedAction {
    pub fn build(package: &str, platform: &str) -> Self {
        Self::platform_bound(ActionKind::Build, package, platform)
    }

    pub fn install(package: &str, platform: &str) -> Self {
        Self::platform_bound(ActionKind::Install, package, platform)
    }

    pub fn test(package: &str, platform: &str) -> Self {
        Self::platform_bound(ActionKind::Test, package, platform)
    }

    pub fn download_binary(package: &str, platform: &str) -> Self {
        Self::platform_bound(ActionKind::DownloadBinary, package, platform)
    }

    pub fn download_source(package: &str) -> Self {
        Self::source(ActionKind::DownloadSource, package)
    }

    pub fn get_source(package: &str) -> Self {
        Self::source(ActionKind::GetSource, package)
    }

    pub fn install_source(package: &str) -> Self {
        Self::source(ActionKind::InstallSource, package)
    }

    fn platform_bound(kind: ActionKind, package: &str, platform: &str) -> Self {
        Self {
            kind,
            package: package.to_string(),
            platform: Some(platform.to_string()),
        }
    }

    fn source(kind: ActionKind, package: &str) -> Self {
        Self {
            kind,
            package: package.to_string(),
            platform: None,
        }
    }
}

impl fmt::Display for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform = self.platform.as_deref().unwrap_or("?");
        match self.kind {
            ActionKind::Build => write!(f, "build {} for {}", self.package, platform),
            ActionKind::Install => write!(f, "install {} for {}", self.package, platform),
            ActionKind::Test => write!(f, "test {} for {}", self.package, platform),
            ActionKind::DownloadBinary => {
                write!(f, "download binary of {}.{}", platform, self.package)
            }
            ActionKind::DownloadSource => write!(f, "download source {}", self.package),
            ActionKind::GetSource => write!(f, "get source {}", self.package),
            ActionKind::InstallSource => write!(f, "install source {}", self.package),
        }
    }
}

/// The host platform identifier (e.g. `x86_64-linux`).
pub fn host_platform() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Resolution failure — all are configuration-time errors detected before
/// any action would execute; none leave a partial schedule behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    UnknownPackage(String),
    NoSuchPrimitive { package: String, primitive: String },
    NoBinaryAndNoBuild(String),
    NoDownloadPrimitive(String),
    CyclicDependency(Vec<String>),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPackage(name) => write!(f, "unknown package '{}'", name),
            Self::NoSuchPrimitive { package, primitive } => {
                write!(f, "package '{}' has no primitive {}", package, primitive)
            }
            Self::NoBinaryAndNoBuild(name) => write!(
                f,
                "package '{}' has neither a download nor a build primitive",
                name
            ),
            Self::NoDownloadPrimitive(name) => {
                write!(f, "no primitive download for package '{}'", name)
            }
            Self::CyclicDependency(path) => {
                write!(f, "cyclic dependency: {}", path.join(" -> "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display_platform_bound() {
        let a = ResolvedAction::build("e3", "x86_64-linux");
        assert_eq!(a.to_string(), "build e3 for x86_64-linux");
        let a = ResolvedAction::install("e3", "x86_64-linux");
        assert_eq!(a.to_string(), "install e3 for x86_64-linux");
        let a = ResolvedAction::test("e3", "x86_64-linux");
        assert_eq!(a.to_string(), "test e3 for x86_64-linux");
        let a = ResolvedAction::download_binary("e3", "x86_64-linux");
        assert_eq!(a.to_string(), "download binary of x86_64-linux.e3");
    }

    #[test]
    fn test_action_display_source_kinds() {
        let a = ResolvedAction::download_source("e3-core-src");
        assert_eq!(a.to_string(), "download source e3-core-src");
        let a = ResolvedAction::get_source("e3-core-src");
        assert_eq!(a.to_string(), "get source e3-core-src");
        let a = ResolvedAction::install_source("e3-core-src");
        assert_eq!(a.to_string(), "install source e3-core-src");
    }

    #[test]
    fn test_source_kinds_carry_no_platform() {
        assert!(ResolvedAction::get_source("x").platform.is_none());
        assert!(ResolvedAction::build("x", "p").platform.is_some());
        assert!(!ActionKind::InstallSource.platform_bound());
        assert!(ActionKind::DownloadBinary.platform_bound());
    }

    #[test]
    fn test_action_identity_is_full_triple() {
        let a = ResolvedAction::build("e3", "x86_64-linux");
        let b = ResolvedAction::build("e3", "x86_64-linux");
        let c = ResolvedAction::build("e3", "aarch64-linux");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_host_platform_shape() {
        let p = host_platform();
        assert!(p.contains('-'));
        assert!(!p.starts_with('-') && !p.ends_with('-'));
    }

    #[test]
    fn test_resolve_error_display() {
        let e = ResolveError::UnknownPackage("ghost".to_string());
        assert!(e.to_string().contains("unknown package 'ghost'"));

        let e = ResolveError::NoSuchPrimitive {
            package: "a".to_string(),
            primitive: "build".to_string(),
        };
        assert!(e.to_string().contains("no primitive build"));

        let e = ResolveError::NoDownloadPrimitive("a".to_string());
        assert!(e.to_string().contains("no primitive download"));

        let e = ResolveError::CyclicDependency(vec![
            "build a".to_string(),
            "build b".to_string(),
            "build a".to_string(),
        ]);
        assert_eq!(e.to_string(), "cyclic dependency: build a -> build b -> build a");
    }

    #[test]
    fn test_action_serialize() {
        let a = ResolvedAction::download_binary("e3", "x86_64-linux");
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"kind\":\"download_binary\""));
        assert!(json.contains("\"package\":\"e3\""));

        let s = ResolvedAction::get_source("e3-core-src");
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("platform"));
    }
}
