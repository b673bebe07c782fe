//! Command-line interface for scoring summit snapshots.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod score;

pub use error::CliError;

use score::{ScoreArgs, run_score};

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_SCORING_CONFIG: &str = "scoring-config";
const ARG_BUFFER_RADIUS: &str = "buffer-radius-meters";
const ARG_FETCH_PAGE_VIEWS: &str = "fetch-page-views";
const ARG_PAGEVIEWS_BASE_URL: &str = "pageviews-base-url";
const ENV_INPUT: &str = "SUMMIT_CMDS_SCORE_INPUT";
const ENV_OUTPUT: &str = "SUMMIT_CMDS_SCORE_OUTPUT";

/// Run the summit CLI with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] when arguments, configuration, input snapshots or
/// the scoring run itself are unusable.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Score(args) => run_score(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "summit",
    about = "Environmental stress scoring for mountain peaks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every peak in a snapshot and write the augmented snapshot.
    Score(ScoreArgs),
}

#[cfg(test)]
mod tests;
