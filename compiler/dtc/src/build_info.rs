//! Build information module

use std::fmt::Write as FmtWrite;

#[doc(hidden)]
#[allow(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::restriction
)]
pub mod build {
    include!(concat!(env!("OUT_DIR"), "/shadow.rs"));
}

/// Returns the string which represents the current dtc version
///
/// The first line names the release and the commit it was built from. The
/// following lines describe the toolchain, and a dirty working tree lists
/// the files that differ from that commit.
pub fn version() -> String {
    let mut out = format!(
        "{name} {version} ({branch}@{commit}{dirty}) built for {target} on {time}",
        name = build::PROJECT_NAME,
        version = build::PKG_VERSION,
        branch = build::BRANCH,
        commit = build::SHORT_COMMIT,
        dirty = if build::GIT_CLEAN { "" } else { ", dirty" },
        target = build::BUILD_TARGET,
        time = build::BUILD_TIME_3339,
    );

    write!(
        out,
        "\n{rust} ({channel}, {mode} build on {os})\n{cargo}",
        rust = build::RUST_VERSION,
        channel = build::RUST_CHANNEL,
        mode = build::BUILD_RUST_CHANNEL,
        os = build::BUILD_OS,
        cargo = build::CARGO_VERSION,
    )
    .expect("writing to a string should succeed");

    if !build::GIT_CLEAN {
        out.push_str("\nmodified files:");
        for line in build::GIT_STATUS_FILE.lines() {
            let file = line
                .strip_suffix(" (dirty)")
                .or_else(|| line.strip_suffix(" (staged)"))
                .unwrap_or(line);
            write!(out, "\n  {file}").expect("writing to a string should succeed");
        }
    }

    out
}
