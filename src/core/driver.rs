//! Plan driver — expands an ordered request sequence into one schedule.
//!
//! Feeds every request through a single resolver so sub-builds shared
//! between requests (and between platforms) land in one cumulative graph.
//! Pure in-memory work; reporting and I/O stay with the caller.

use super::resolver::Resolver;
use super::types::{ActionRequest, ResolveError, ResolvedAction};
use crate::specs::SpecRepo;

/// Resolve a whole plan for each requested platform.
///
/// Either every request resolves and the complete ordered schedule is
/// returned, or the first failure aborts with no schedule at all.
pub fn run_plan(
    specs: &SpecRepo,
    requests: &[ActionRequest],
    platforms: &[String],
) -> Result<Vec<ResolvedAction>, ResolveError> {
    let mut resolver = Resolver::new(specs);
    for platform in platforms {
        for request in requests {
            resolver.resolve(request, platform)?;
        }
    }
    Ok(resolver.schedule())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ActionKind, RequestKind};
    use std::path::Path;

    fn repo(dir: &Path) -> SpecRepo {
        std::fs::write(dir.join("conf.yaml"), "api_version: \"1.4\"\n").unwrap();
        std::fs::write(
            dir.join("e3.yaml"),
            "primitives: [build, test]\ntest_deps: [python-virtualenv]\nsource_packages: [e3-core-src]\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("python-virtualenv.yaml"),
            "primitives: [build, install]\n",
        )
        .unwrap();
        SpecRepo::load(dir).unwrap()
    }

    #[test]
    fn test_build_plan_ends_with_requested_build() {
        let dir = tempfile::tempdir().unwrap();
        let specs = repo(dir.path());
        let requests = vec![ActionRequest::new(RequestKind::Build, "e3")];
        let schedule =
            run_plan(&specs, &requests, &["x86_64-linux".to_string()]).unwrap();
        assert_eq!(
            schedule.last().unwrap().to_string(),
            "build e3 for x86_64-linux"
        );
    }

    #[test]
    fn test_requests_share_one_graph() {
        let dir = tempfile::tempdir().unwrap();
        let specs = repo(dir.path());
        let requests = vec![
            ActionRequest::new(RequestKind::Build, "e3"),
            ActionRequest::new(RequestKind::Test, "e3"),
        ];
        let schedule =
            run_plan(&specs, &requests, &["x86_64-linux".to_string()]).unwrap();

        // Build(e3) appears once even though both requests need it.
        let builds = schedule
            .iter()
            .filter(|a| a.kind == ActionKind::Build && a.package == "e3")
            .count();
        assert_eq!(builds, 1);
        assert_eq!(schedule.last().unwrap().kind, ActionKind::Test);
    }

    #[test]
    fn test_multiple_platforms_resolve_once_each() {
        let dir = tempfile::tempdir().unwrap();
        let specs = repo(dir.path());
        let requests = vec![ActionRequest::new(RequestKind::Build, "e3")];
        let platforms = vec!["x86_64-linux".to_string(), "aarch64-linux".to_string()];
        let schedule = run_plan(&specs, &requests, &platforms).unwrap();
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_failure_yields_no_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let specs = repo(dir.path());
        let requests = vec![
            ActionRequest::new(RequestKind::Build, "e3"),
            ActionRequest::new(RequestKind::Build, "ghost"),
        ];
        let err = run_plan(&specs, &requests, &["x86_64-linux".to_string()]).unwrap_err();
        assert_eq!(err, ResolveError::UnknownPackage("ghost".to_string()));
    }
}
