//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `habitloop_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("habitloop_core version={}", habitloop_core::core_version());
    println!(
        "habitloop_core default_log_level={}",
        habitloop_core::default_log_level()
    );
}
