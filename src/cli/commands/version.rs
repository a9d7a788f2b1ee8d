//! Version display
//!
//! Prints the package version along with the size of the built-in catalog
//! the binary ships with.

use serde_json::json;

use crate::catalog::builtin;
use crate::cli::args::{OutputFormat, VersionArgs};

/// Print version information.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let emotions = builtin::emotions().len();
    let transitions = builtin::transitions().map_or(0, |t| t.len());

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version}");
            println!("{}", env!("CARGO_PKG_DESCRIPTION"));
            println!("built-in catalog: {emotions} emotions, {transitions} transitions");
        }
        OutputFormat::Json => {
            let out = json!({
                "name": name,
                "version": version,
                "builtin": { "emotions": emotions, "transitions": transitions },
            });
            println!("{out}");
        }
    }
}
