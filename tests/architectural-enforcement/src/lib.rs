//! Architectural Enforcement
//!
//! Source-scanning helpers for the integration tests in `tests/`. They keep
//! two rules from eroding:
//! - the reducers (accumulator, extractor, result board, data model) stay
//!   pure: no async runtime, no I/O, no clocks
//! - async code never blocks on I/O or sleeps
//!
//! Scanning is line-based. Everything from the first `#[cfg(test)]` in a file
//! onwards is test code and is skipped, as are comments.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace this crate lives in
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir`, sorted for stable reports
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// One line of production code
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    /// 1-based line number
    pub number: usize,
    /// The line with any trailing `//` comment removed
    pub code: &'a str,
    /// The whole line
    pub raw: &'a str,
}

/// Production lines of a file: up to the first `#[cfg(test)]`
pub fn production_lines(content: &str) -> Vec<SourceLine<'_>> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| SourceLine {
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line),
            raw: line,
        })
        .collect()
}

/// Whether the function enclosing `lines[idx]` is `async`
///
/// Returns `None` outside any function.
pub fn enclosing_fn_is_async(lines: &[SourceLine<'_>], idx: usize) -> Option<bool> {
    for line in lines[..idx].iter().rev() {
        let signature = strip_visibility(line.code.trim());
        if signature.starts_with("async fn ") {
            return Some(true);
        }
        if signature.starts_with("fn ") {
            return Some(false);
        }
        if signature.starts_with("mod ") || signature.starts_with("impl") {
            return None;
        }
    }
    None
}

fn strip_visibility(line: &str) -> &str {
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return rest;
        }
    }
    line
}

/// A rule broken at one line
#[derive(Debug)]
pub struct Violation {
    /// File the line is in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What was found
    pub reason: &'static str,
    /// The offending line, trimmed
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.reason,
            self.text
        )
    }
}

/// Scan every production line of `path` with `check`
pub fn scan_file(
    path: &Path,
    violations: &mut Vec<Violation>,
    check: impl Fn(&[SourceLine<'_>], usize) -> Option<&'static str>,
) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let lines = production_lines(&content);
    for idx in 0..lines.len() {
        if let Some(reason) = check(&lines, idx) {
            violations.push(Violation {
                path: path.to_path_buf(),
                line: lines[idx].number,
                reason,
                text: lines[idx].raw.trim().to_string(),
            });
        }
    }
}

/// Panic with a readable report if anything was found
pub fn assert_no_violations(title: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s). Fix these before merging!", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let content = "fn a() {}\n// note\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        let lines = production_lines(content);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].code, "");
    }

    #[test]
    fn test_async_detection() {
        let content = "pub async fn bad() {\n    std::fs::read(\"x\");\n}\nfn ok() {\n    std::fs::read(\"x\");\n}\n";
        let lines = production_lines(content);
        assert_eq!(enclosing_fn_is_async(&lines, 1), Some(true));
        assert_eq!(enclosing_fn_is_async(&lines, 4), Some(false));
        assert_eq!(enclosing_fn_is_async(&lines, 0), None);
    }

    #[test]
    fn test_workspace_root_has_core_crate() {
        assert!(workspace_root().join("analyzer/core/src/lib.rs").exists());
    }
}
