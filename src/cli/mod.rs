//! CLI subcommands — create, exec, show-config.

use crate::sandbox::{exec, Sandbox, SpecSource, SANDBOX_DIRS};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new sandbox
    Create {
        /// Sandbox root directory
        root: PathBuf,

        /// Copy specs from a local directory
        #[arg(long)]
        spec_dir: Option<PathBuf>,

        /// Clone specs from a git repository
        #[arg(long)]
        spec_git_url: Option<String>,
    },

    /// Resolve a plan inside a sandbox and report the action schedule
    Exec {
        /// Plan file to resolve
        #[arg(long)]
        plan: PathBuf,

        /// Load specs from a local directory instead of the sandbox
        #[arg(long)]
        spec_dir: Option<PathBuf>,

        /// Refresh sandbox specs from a git repository first
        #[arg(long)]
        spec_git_url: Option<String>,

        /// Create the sandbox first if it does not exist
        #[arg(long)]
        create_sandbox: bool,

        /// Target platform (defaults to the host)
        #[arg(long)]
        platform: Option<String>,

        /// Sandbox root directory
        root: PathBuf,
    },

    /// Show sandbox configuration
    ShowConfig {
        /// Sandbox root directory
        root: PathBuf,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Create {
            root,
            spec_dir,
            spec_git_url,
        } => cmd_create(&root, spec_dir.as_deref(), spec_git_url.as_deref()),
        Commands::Exec {
            plan,
            spec_dir,
            spec_git_url,
            create_sandbox,
            platform,
            root,
        } => cmd_exec(
            &root,
            &plan,
            spec_dir.as_deref(),
            spec_git_url.as_deref(),
            create_sandbox,
            platform.as_deref(),
        ),
        Commands::ShowConfig { root } => cmd_show_config(&root),
    }
}

fn spec_source(
    spec_dir: Option<&Path>,
    spec_git_url: Option<&str>,
) -> Result<Option<SpecSource>, String> {
    match (spec_dir, spec_git_url) {
        (Some(_), Some(_)) => {
            Err("use either --spec-dir or --spec-git-url, not both".to_string())
        }
        (Some(dir), None) => Ok(Some(SpecSource::Local(dir.to_path_buf()))),
        (None, Some(url)) => Ok(Some(SpecSource::Git(url.to_string()))),
        (None, None) => Ok(None),
    }
}

fn cmd_create(
    root: &Path,
    spec_dir: Option<&Path>,
    spec_git_url: Option<&str>,
) -> Result<(), String> {
    let source = spec_source(spec_dir, spec_git_url)?;
    let sandbox = Sandbox::create(root, source.as_ref()).map_err(|e| e.to_string())?;
    println!("Created sandbox at {}", sandbox.root().display());
    Ok(())
}

fn cmd_exec(
    root: &Path,
    plan: &Path,
    spec_dir: Option<&Path>,
    spec_git_url: Option<&str>,
    create_sandbox: bool,
    platform: Option<&str>,
) -> Result<(), String> {
    if spec_dir.is_some() && spec_git_url.is_some() {
        return Err("use either --spec-dir or --spec-git-url, not both".to_string());
    }

    let cfg = exec::ExecConfig {
        root,
        plan,
        spec_dir,
        spec_git_url,
        create_sandbox,
        platform,
    };
    let schedule = exec::exec(&cfg)?;
    for action in &schedule {
        println!("{}", action);
    }
    Ok(())
}

fn cmd_show_config(root: &Path) -> Result<(), String> {
    let sandbox = Sandbox::load(root).map_err(|e| e.to_string())?;
    let meta = sandbox.read_meta().map_err(|e| e.to_string())?;

    println!("sandbox = {}", meta.root.display());
    for dir in SANDBOX_DIRS {
        println!("  {} = {}", dir, sandbox.subdir(dir).display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_specs(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("conf.yaml"), "api_version: \"1.4\"\n").unwrap();
        std::fs::write(dir.join("e3.yaml"), "primitives: [build]\n").unwrap();
    }

    #[test]
    fn test_create_and_show_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        cmd_create(&root, None, None).unwrap();
        cmd_show_config(&root).unwrap();
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        cmd_create(&root, None, None).unwrap();
        let err = cmd_create(&root, None, None).unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn test_create_with_local_specs() {
        let dir = tempfile::tempdir().unwrap();
        let specs = dir.path().join("specs-src");
        write_specs(&specs);
        let root = dir.path().join("sbx");
        cmd_create(&root, Some(&specs), None).unwrap();
        assert!(root.join("specs").join("e3.yaml").is_file());
    }

    #[test]
    fn test_create_rejects_conflicting_sources() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_create(
            &dir.path().join("sbx"),
            Some(Path::new("specs")),
            Some("https://example.com/specs.git"),
        )
        .unwrap_err();
        assert!(err.contains("not both"));
    }

    #[test]
    fn test_show_config_non_sandbox_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_show_config(dir.path()).unwrap_err();
        assert!(err.contains("is not a sandbox"));
    }

    #[test]
    fn test_dispatch_create() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        dispatch(Commands::Create {
            root: root.clone(),
            spec_dir: None,
            spec_git_url: None,
        })
        .unwrap();
        assert!(root.join("meta").join("sandbox.yaml").is_file());
    }

    #[test]
    fn test_dispatch_exec() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        let specs = dir.path().join("specs-src");
        write_specs(&specs);
        let plan = dir.path().join("test.plan");
        std::fs::write(&plan, "anod_build('e3')\n").unwrap();

        dispatch(Commands::Exec {
            plan,
            spec_dir: Some(specs),
            spec_git_url: None,
            create_sandbox: true,
            platform: Some("x86_64-linux".to_string()),
            root,
        })
        .unwrap();
    }

    #[test]
    fn test_dispatch_exec_missing_plan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        cmd_create(&root, None, None).unwrap();

        let err = dispatch(Commands::Exec {
            plan: dir.path().join("noplan"),
            spec_dir: None,
            spec_git_url: None,
            create_sandbox: false,
            platform: None,
            root,
        })
        .unwrap_err();
        assert!(err.contains("plan file"));
    }

    #[test]
    fn test_dispatch_show_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sbx");
        cmd_create(&root, None, None).unwrap();
        dispatch(Commands::ShowConfig { root }).unwrap();
    }
}
