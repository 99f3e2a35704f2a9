//! Command: print version information.
use std::io::Write;

use anyhow::Result;

/// Version stamped by the build script, or the crate version.
pub const VERSION: &str = match option_env!("PROVISION_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Print the provision version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    writeln!(std::io::stdout().lock(), "provision {VERSION}")?;
    Ok(())
}
