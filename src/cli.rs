use crate::models::{MatchId, PlayerIdentity};
use crate::services::stats::{DEFAULT_MATCH_COUNT, DEFAULT_TOP_N};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tft-match-stats")]
#[command(about = "Recent-match statistics for TFT players, backed by a local match cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the index database and cached matches
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log cache decisions and remote calls
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print aggregate statistics over a player's recent matches
    Stats {
        /// Riot ID, e.g. "Manon Win#236KK"
        #[arg(value_parser = parse_identity)]
        player: PlayerIdentity,

        /// Number of recent matches to consider
        #[arg(long, short = 'c', default_value_t = DEFAULT_MATCH_COUNT, value_parser = clap::value_parser!(u32).range(1..=200))]
        count: u32,

        /// Placement cutoff for the top-N rate
        #[arg(long, short = 't', default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u32).range(1..=8))]
        top: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a player's recent matches into the local cache
    Sync {
        #[arg(value_parser = parse_identity)]
        player: PlayerIdentity,

        #[arg(long, short = 'c', default_value_t = DEFAULT_MATCH_COUNT, value_parser = clap::value_parser!(u32).range(1..=200))]
        count: u32,
    },

    /// Print the raw payload of one match
    Match {
        #[arg(value_parser = parse_match_id)]
        match_id: MatchId,
    },
}

fn parse_identity(s: &str) -> Result<PlayerIdentity, String> {
    s.parse()
}

fn parse_match_id(s: &str) -> Result<MatchId, String> {
    MatchId::new(s).map_err(|e| e.to_string())
}
