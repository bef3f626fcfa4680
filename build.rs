//! Build script for tlpool.
//!
//! Reports the enabled features and flags combinations that are likely
//! unintended.

use std::env;

fn main() {
    // Re-run if features change
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DEBUG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");

    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let debug_enabled = env::var("CARGO_FEATURE_DEBUG").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    // --- Checked behaviour ---
    if diagnostics_enabled && is_release {
        emit_info("Protocol checks enabled in release build");
        emit_note("Attach/detach misuse, leaks and misrouted frees panic by default.");
        emit_note("Set TLPOOL_STRICT=warn to report without panicking.");
    }

    // --- Debug Features ---
    if debug_enabled {
        emit_info("Debug features enabled");
        emit_note("  • Memory poisoning (freed blocks filled with 0xCD)");
        emit_note("  • Allocation backtraces in leak reports");

        if is_release {
            emit_warning("Debug features enabled in release build!");
            emit_note("Every pooled allocation captures a backtrace. Consider disabling for production.");
        }
    }

    // --- Log ---
    if log_enabled {
        emit_info("Diagnostics mirrored to the log crate (target \"tlpool\")");
    }

    // --- Parking Lot ---
    if parking_lot_enabled {
        emit_info("Using parking_lot for diagnostic sink mutexes");
    }
}

fn emit_info(msg: &str) {
    println!("cargo:warning=[tlpool] {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[tlpool]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[tlpool] WARNING: {}", msg);
}
