//! Integration Test: Core Crate Boundaries
//!
//! **Policy**: `widget-core` is a synchronous library.
//! - It does not depend on an async runtime
//! - Its production code propagates errors instead of calling
//!   `unwrap()` / `expect()`
//!
//! **Exceptions**: test modules, integration tests and doc examples

use std::fs;

use architectural_enforcement::{report, scan, workspace_root};

#[test]
fn test_core_has_no_async_runtime_dependency() {
    let manifest = fs::read_to_string(workspace_root().join("widget/core/Cargo.toml"))
        .expect("widget/core/Cargo.toml should be readable");

    for runtime in ["tokio", "async-std", "smol"] {
        let declared = manifest.lines().any(|line| {
            let key = line.split('=').next().unwrap_or("").trim();
            key == runtime
        });
        assert!(!declared, "widget-core must not depend on {runtime}");
    }
}

#[test]
fn test_core_does_not_use_async() {
    let violations = scan("widget/core/src", |code| {
        code.contains("tokio::") || code.contains("async fn") || code.contains(".await")
    });
    report("no async in widget/core", &violations);
}

#[test]
fn test_no_unwrap_or_expect_in_core() {
    let violations = scan("widget/core/src", |code| {
        code.contains(".unwrap()") || code.contains(".expect(")
    });
    report("no unwrap()/expect() in widget/core production code", &violations);
}
