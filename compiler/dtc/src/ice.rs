//! Internal error (ICE) handling
//!
//! When dtc panics, this module prints a message telling the user that the
//! failure is a bug in dtc rather than in their program, along with the
//! version and command line needed to reproduce it.

use std::panic::PanicHookInfo;

/// Handles panics and generates the ICE screen
fn ice_hook(
    default_panic_hook: &'static (dyn Fn(&PanicHookInfo<'_>) + Send + Sync),
    panic_info: &PanicHookInfo,
) {
    eprintln!("error: internal error encountered: thread panicked");
    eprintln!("note: this is not a problem with your program. this is ALWAYS a dtc bug.");
    eprintln!("note: please report it along with the program and contracts that caused it");
    eprintln!();
    eprintln!(
        "{}",
        super::build_info::version()
            .lines()
            .map(|line| format!("note: {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    );
    eprintln!();
    eprintln!(
        "note: command line arguments: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    eprintln!();
    default_panic_hook(panic_info);
    eprintln!();
    eprintln!("error: end internal error. checking failed.");
}

/// Configures the global panic (ICE) hook
///
/// Backtraces are enabled unless the user already asked for full ones.
pub fn setup_panic_hook() {
    // the hook must be 'static, and it lives until the process exits anyway
    let default_panic_hook: &'static _ = Box::leak(std::panic::take_hook());

    std::panic::set_hook(Box::new(|panic_info| {
        ice_hook(default_panic_hook, panic_info);
    }));

    if std::env::var("RUST_BACKTRACE").ok().as_deref() != Some("full") {
        std::env::set_var("RUST_BACKTRACE", "1");
    }
}
