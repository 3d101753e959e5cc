//! Spec-repository checkout via the `git` command line.
//!
//! The engine only needs "give me a working tree for this URL"; transport
//! details stay with git itself. A re-checkout replaces any previous tree
//! at the destination.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Clone `url` into `dest`, replacing any previous checkout.
pub fn checkout(url: &str, dest: &Path) -> Result<PathBuf, String> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)
            .map_err(|e| format!("cannot clear checkout {}: {}", dest.display(), e))?;
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }

    let output = Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg(url)
        .arg(dest)
        .output()
        .map_err(|e| format!("failed to run git: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "git clone of {} failed: {}",
            url,
            stderr.trim()
        ));
    }
    Ok(dest.to_path_buf())
}
