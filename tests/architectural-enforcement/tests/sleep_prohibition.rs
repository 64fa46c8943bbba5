//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. The core crate is
//! driven by a caller's tick; the daemon paces frames with
//! `tokio::time::interval`, never with sleep.
//! **Exceptions**: test code

use architectural_enforcement::{report, scan};

fn is_sleep(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_core() {
    report("no sleep in widget/core", &scan("widget/core/src", is_sleep));
}

#[test]
fn test_no_sleep_in_daemon() {
    report("no sleep in widget/daemon", &scan("widget/daemon/src", is_sleep));
}
