mod cli;
mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::error::exit_code;
use crate::services::{GameStatsAnalyser, MatchCache, RiotClient, Source};
use crate::utils::{BlobCache, IndexStore};
use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing::{info, warn};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<error::Error>() {
                Some(err) => ExitCode::from(err.exit_code() as u8),
                None => ExitCode::from(exit_code::GENERAL_ERROR as u8),
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = cli.data_dir {
        settings = settings.with_data_dir(dir);
    }

    let index = IndexStore::open(&settings.db_path())
        .with_context(|| format!("opening index at {}", settings.db_path().display()))?;
    let blobs = BlobCache::open(settings.cache_dir())?;
    let api = RiotClient::new(&settings)?;
    let cache = MatchCache::new(api, index, blobs);

    match cli.command {
        Command::Stats {
            player,
            count,
            top,
            json,
        } => {
            let stats = GameStatsAnalyser::new(&cache)
                .top_n(top)
                .analyse(&player, count)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{stats}");
            }
        }
        Command::Sync { player, count } => {
            let account_id = cache.get_account_id(&player)?;
            let match_ids = cache.get_match_ids(&account_id, count)?;

            let (mut fetched, mut cached, mut failed) = (0, 0, 0);
            for match_id in &match_ids {
                match cache.get_match_with_source(match_id) {
                    Ok((_, Source::Remote)) => fetched += 1,
                    Ok((_, Source::Cache)) => cached += 1,
                    Err(e) => {
                        warn!(%match_id, error = %e, "match not cached");
                        failed += 1;
                    }
                }
            }
            info!(
                total_cached = cache.index().cached_match_count()?,
                "sync finished"
            );
            println!(
                "{player}: {} matches listed, {fetched} fetched, {cached} already cached, {failed} failed",
                match_ids.len()
            );
        }
        Command::Match { match_id } => {
            let record = cache.get_match(&match_id)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(record.bytes())?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
