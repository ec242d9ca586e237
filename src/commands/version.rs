//! Command: print version information.

/// Version string of this build.
#[must_use]
pub fn version() -> &'static str {
    option_env!("INTPKG_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the tool version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("intpkg {}", version());
}
