//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async code in the analyzer and the CLI MUST NOT block.
//! **Required**: `tokio::io` / `reqwest` async APIs inside `async fn`.
//!
//! Blocking calls are acceptable in plain functions (config loading before
//! the first request, writing a rendered snapshot) and in test code.
//! Sleeping is never acceptable outside tests: wait on the stream instead.

use std::path::Path;

use architectural_enforcement::{
    assert_no_violations, enclosing_fn_is_async, rust_files, scan_file, workspace_root,
    SourceLine, Violation,
};

const SCANNED: &[&str] = &["analyzer/core/src", "analyzer/cli/src"];

/// Blocking in any function
fn always_forbidden(code: &str) -> Option<&'static str> {
    if code.contains("reqwest::blocking") {
        return Some("Blocking HTTP client");
    }
    if code.contains("thread::sleep") || code.contains("time::sleep(") {
        return Some("Sleep");
    }
    None
}

/// Blocking only when inside an `async fn`
fn forbidden_in_async(code: &str) -> Option<&'static str> {
    if code.contains("std::fs::") {
        return Some("Blocking file I/O in async");
    }
    if code.contains("std::net::") {
        return Some("Blocking network I/O in async");
    }
    if code.contains("std::io::stdin()") || code.contains("std::io::stdout()") {
        return Some("Blocking stdin/stdout in async");
    }
    if code.contains("std::process::Command") {
        return Some("Blocking process I/O in async");
    }
    None
}

fn check_line(lines: &[SourceLine<'_>], idx: usize) -> Option<&'static str> {
    let code = lines[idx].code;
    always_forbidden(code).or_else(|| {
        if enclosing_fn_is_async(lines, idx) == Some(true) {
            forbidden_in_async(code)
        } else {
            None
        }
    })
}

#[test]
fn test_no_blocking_io_in_async_code() {
    let root = workspace_root();
    let mut violations: Vec<Violation> = Vec::new();

    for dir in SCANNED {
        let dir = root.join(dir);
        assert!(dir.exists(), "missing source directory {}", dir.display());
        for file in rust_files(&dir) {
            scan_file(&file, &mut violations, check_line);
        }
    }

    assert_no_violations("Blocking I/O found in async code!", &violations);
}

#[test]
fn test_detector_flags_blocking_read_in_async_fn() {
    let dir = tempdir_with(
        "async fn load() {\n    let s = std::fs::read_to_string(\"a\");\n}\n\
         fn load_sync() {\n    let s = std::fs::read_to_string(\"a\");\n}\n",
    );
    let mut violations = Vec::new();
    scan_file(&dir.join("sample.rs"), &mut violations, check_line);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line, 2);
    assert_eq!(violations[0].reason, "Blocking file I/O in async");
}

#[test]
fn test_detector_flags_sleep_anywhere() {
    let dir = tempdir_with("fn wait() {\n    std::thread::sleep(d);\n}\n");
    let mut violations = Vec::new();
    scan_file(&dir.join("sample.rs"), &mut violations, check_line);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].reason, "Sleep");
}

/// Write `content` as `sample.rs` in a fresh directory under the target dir
fn tempdir_with(content: &str) -> std::path::PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(format!(
        "blocking-io-{}",
        content.len()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("sample.rs"), content).unwrap();
    dir
}
