//! Plan-document parsing.
//!
//! A plan is a line sequence of intent calls:
//!
//! ```text
//! anod_build('e3')
//! anod_install("gps")
//! anod_test('e3')
//! ```
//!
//! Blank lines and `#` comments are ignored. Each call becomes one
//! [`ActionRequest`] in document order.

use super::types::{ActionRequest, RequestKind};
use std::path::Path;

/// Parse a plan file from disk.
pub fn parse_plan_file(path: &Path) -> Result<Vec<ActionRequest>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read plan {}: {}", path.display(), e))?;
    parse_plan(&content)
}

/// Parse a plan from a string.
pub fn parse_plan(content: &str) -> Result<Vec<ActionRequest>, String> {
    let mut requests = Vec::new();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let request =
            parse_call(line).map_err(|e| format!("plan line {}: {}", lineno + 1, e))?;
        requests.push(request);
    }
    Ok(requests)
}

fn parse_call(line: &str) -> Result<ActionRequest, String> {
    let open = line
        .find('(')
        .ok_or_else(|| format!("expected a call like anod_build('pkg'), got '{}'", line))?;
    if !line.ends_with(')') {
        return Err(format!("missing closing parenthesis in '{}'", line));
    }

    let kind = match line[..open].trim() {
        "anod_build" => RequestKind::Build,
        "anod_install" => RequestKind::Install,
        "anod_test" => RequestKind::Test,
        other => return Err(format!("unknown call '{}'", other)),
    };

    let package = unquote(line[open + 1..line.len() - 1].trim())?;
    if package.is_empty() {
        return Err("empty package name".to_string());
    }
    Ok(ActionRequest::new(kind, &package))
}

fn unquote(arg: &str) -> Result<String, String> {
    let bytes = arg.as_bytes();
    if arg.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[arg.len() - 1] == bytes[0]
    {
        Ok(arg[1..arg.len() - 1].to_string())
    } else {
        Err(format!("expected a quoted package name, got '{}'", arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_kinds() {
        let plan = "anod_build('e3')\nanod_install(\"gps\")\nanod_test('e3')\n";
        let requests = parse_plan(plan).unwrap();
        assert_eq!(
            requests,
            vec![
                ActionRequest::new(RequestKind::Build, "e3"),
                ActionRequest::new(RequestKind::Install, "gps"),
                ActionRequest::new(RequestKind::Test, "e3"),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let plan = "\n# nightly plan\n\nanod_build('e3')\n   \n";
        let requests = parse_plan(plan).unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let requests = parse_plan("  anod_build( 'e3' )  ").unwrap();
        assert_eq!(requests[0].package, "e3");
    }

    #[test]
    fn test_unknown_call_rejected() {
        let err = parse_plan("anod_deploy('e3')").unwrap_err();
        assert!(err.contains("plan line 1"));
        assert!(err.contains("unknown call 'anod_deploy'"));
    }

    #[test]
    fn test_unquoted_argument_rejected() {
        let err = parse_plan("anod_build(e3)").unwrap_err();
        assert!(err.contains("quoted package name"));
    }

    #[test]
    fn test_missing_parenthesis_rejected() {
        assert!(parse_plan("anod_build 'e3'").is_err());
        assert!(parse_plan("anod_build('e3'").is_err());
    }

    #[test]
    fn test_empty_package_rejected() {
        let err = parse_plan("anod_build('')").unwrap_err();
        assert!(err.contains("empty package name"));
    }

    #[test]
    fn test_error_names_offending_line() {
        let err = parse_plan("anod_build('ok')\nanod_nope('x')").unwrap_err();
        assert!(err.starts_with("plan line 2"));
    }

    #[test]
    fn test_parse_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.plan");
        std::fs::write(&path, "anod_build('e3')\n").unwrap();
        let requests = parse_plan_file(&path).unwrap();
        assert_eq!(requests[0], ActionRequest::new(RequestKind::Build, "e3"));
    }

    #[test]
    fn test_parse_plan_file_missing() {
        let err = parse_plan_file(Path::new("/nonexistent/x.plan")).unwrap_err();
        assert!(err.contains("cannot read plan"));
    }
}
