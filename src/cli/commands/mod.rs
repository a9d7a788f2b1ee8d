//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod catalog;
pub mod session;
pub mod version;

use crate::cli::args::{CatalogSubcommand, Cli, Commands, SessionSubcommand};
use crate::error::MoodHarmonyError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), MoodHarmonyError> {
    match cli.command {
        Commands::Catalog(cmd) => match cmd.subcommand {
            CatalogSubcommand::List(args) => catalog::list(&args),
            CatalogSubcommand::Show(args) => catalog::show(&args),
            CatalogSubcommand::Validate(args) => catalog::validate(&args),
        },
        Commands::Session(cmd) => match cmd.subcommand {
            SessionSubcommand::Run(args) => session::run(&args).await,
            SessionSubcommand::Resume(args) => session::resume(&args).await,
        },
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
