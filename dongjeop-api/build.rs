//! Stamps the binary with the revision it was built from.
//!
//! Sets `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` for `env!`. A
//! source tree without git (release tarball, container build context) can
//! pass the revision in `DONGJEOP_BUILD_HASH` instead.

use std::path::Path;
use std::process::Command;

const HASH_OVERRIDE_ENV: &str = "DONGJEOP_BUILD_HASH";

fn main() {
    let revision = std::env::var(HASH_OVERRIDE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| git(&["describe", "--always", "--dirty", "--abbrev=8"]))
        .unwrap_or_else(|| "unknown".to_string());

    let stamped_at = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("GIT_HASH", revision.as_str()),
        ("BUILD_TIMESTAMP", stamped_at.as_str()),
        ("BUILD_PROFILE", profile.as_str()),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }

    // Re-stamp when the checked-out revision moves, not on every build
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_ENV);
    if let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]) {
        let git_dir = Path::new(&git_dir);
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("index").display());
    }
}

/// Trimmed stdout of a git command, `None` when git is missing or fails
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
