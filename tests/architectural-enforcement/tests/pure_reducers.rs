//! Integration Test: Pure Reducers
//!
//! The accumulator, the extractor, the result board and the data model are
//! plain state transitions. They are driven by the analyzer and tested
//! without a runtime, so they must not reach for one.
//!
//! **Policy**: these files MUST NOT use tokio, async/await, threads, clocks,
//! the filesystem, the network, or an HTTP client.

use architectural_enforcement::{assert_no_violations, scan_file, workspace_root, Violation};

const PURE_FILES: &[&str] = &[
    "accumulator.rs",
    "events.rs",
    "extractor.rs",
    "messages.rs",
    "results.rs",
    "sentiment.rs",
];

const FORBIDDEN: &[(&str, &str)] = &[
    ("tokio", "Async runtime"),
    ("async ", "Async code"),
    (".await", "Async code"),
    ("std::thread", "Threads"),
    ("std::fs", "Filesystem I/O"),
    ("std::net", "Network I/O"),
    ("reqwest", "HTTP client"),
    ("Instant::now", "Clock read"),
    ("SystemTime", "Clock read"),
];

#[test]
fn test_reducers_are_pure() {
    let src = workspace_root().join("analyzer/core/src");
    let mut violations: Vec<Violation> = Vec::new();

    for file in PURE_FILES {
        let path = src.join(file);
        assert!(path.exists(), "missing reducer file {}", path.display());

        scan_file(&path, &mut violations, |lines, idx| {
            let code = lines[idx].code;
            FORBIDDEN
                .iter()
                .find(|(token, _)| code.contains(token))
                .map(|(_, reason)| *reason)
        });
    }

    assert_no_violations("Impure code found in reducer modules!", &violations);
}
