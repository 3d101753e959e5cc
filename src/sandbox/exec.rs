//! Exec orchestration — specs in, plan in, ordered action schedule out.
//!
//! Wires the sandbox, spec repository, plan parser and driver together for
//! one run. Either a complete schedule comes back, or the first
//! configuration error aborts with nothing scheduled; the schedule is also
//! appended to the sandbox's JSONL action log.

use super::{Sandbox, SandboxError, SpecSource};
use crate::core::types::{host_platform, ResolvedAction};
use crate::core::{driver, plan};
use crate::specs::SpecRepo;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration for one exec run.
pub struct ExecConfig<'a> {
    pub root: &'a Path,
    pub plan: &'a Path,
    pub spec_dir: Option<&'a Path>,
    pub spec_git_url: Option<&'a str>,
    pub create_sandbox: bool,
    pub platform: Option<&'a str>,
}

/// Resolve a plan inside a sandbox and return the ordered schedule.
pub fn exec(cfg: &ExecConfig) -> Result<Vec<ResolvedAction>, String> {
    let sandbox = open_sandbox(cfg).map_err(|e| e.to_string())?;

    let spec_dir = resolve_spec_dir(cfg, &sandbox).map_err(|e| e.to_string())?;
    if !cfg.plan.is_file() {
        return Err(SandboxError::PlanFileMissing(cfg.plan.to_path_buf()).to_string());
    }

    let specs = SpecRepo::load(&spec_dir)?;
    let requests = plan::parse_plan_file(cfg.plan)?;
    let platform = cfg
        .platform
        .map(str::to_string)
        .unwrap_or_else(host_platform);

    let schedule =
        driver::run_plan(&specs, &requests, &[platform]).map_err(|e| e.to_string())?;

    append_action_log(&sandbox, &schedule)?;
    Ok(schedule)
}

fn open_sandbox(cfg: &ExecConfig) -> Result<Sandbox, SandboxError> {
    match Sandbox::load(cfg.root) {
        Ok(sandbox) => Ok(sandbox),
        Err(SandboxError::NotASandbox(_)) if cfg.create_sandbox => {
            Sandbox::create(cfg.root, None)
        }
        Err(e) => Err(e),
    }
}

/// Pick the spec directory for this run: an explicit local directory is
/// used in place, a git URL is checked out into the sandbox first, and
/// with neither the sandbox's own `specs/` serves.
fn resolve_spec_dir(cfg: &ExecConfig, sandbox: &Sandbox) -> Result<PathBuf, SandboxError> {
    if let Some(dir) = cfg.spec_dir {
        if !dir.is_dir() {
            return Err(SandboxError::SpecDirMissing(dir.to_path_buf()));
        }
        return Ok(dir.to_path_buf());
    }
    if let Some(url) = cfg.spec_git_url {
        sandbox.materialize_specs(&SpecSource::Git(url.to_string()))?;
    }
    Ok(sandbox.spec_dir())
}

#[derive(Serialize)]
struct ActionRecord<'a> {
    seq: usize,
    #[serde(flatten)]
    action: &'a ResolvedAction,
    display: String,
}

/// Append the schedule to the sandbox's append-only JSONL action log.
fn append_action_log(sandbox: &Sandbox, schedule: &[ResolvedAction]) -> Result<(), String> {
    let path = sandbox.log_dir().join("actions.jsonl");
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;

    for (seq, action) in schedule.iter().enumerate() {
        let record = ActionRecord {
            seq,
            action,
            display: action.to_string(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| format!("cannot encode action record: {}", e))?;
        writeln!(file, "{}", line)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    }
    Ok(())
}
