use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, ParticipantRecord, PlayerIdentity};
use crate::services::api::MatchApi;
use crate::services::cache::MatchCache;
use serde::Serialize;
use std::fmt;
use tracing::warn;

pub const DEFAULT_MATCH_COUNT: u32 = 20;
pub const DEFAULT_TOP_N: u32 = 4;

/// Aggregate performance over a player's recent matches.
///
/// Matches whose participant record cannot be obtained are counted in
/// `skipped` and contribute zero to every sum; averages are still taken over
/// all listed matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    pub player: String,
    pub matches: usize,
    pub skipped: usize,
    pub top_n: u32,
    pub top_n_rate: f64,
    pub average_placement: f64,
    pub average_gold_left: f64,
    pub average_game_length: u64,
    pub average_damage_to_players: f64,
    pub average_players_eliminated: f64,
}

#[derive(Default)]
struct Totals {
    top_n: u64,
    placement: u64,
    gold_left: i64,
    time_eliminated: f64,
    damage: i64,
    eliminated: i64,
}

impl Totals {
    fn add(&mut self, p: &ParticipantRecord, top_n: u32) {
        if p.placement <= top_n {
            self.top_n += 1;
        }
        self.placement += u64::from(p.placement);
        self.gold_left += p.gold_left;
        self.time_eliminated += p.time_eliminated;
        self.damage += p.total_damage_to_players;
        self.eliminated += p.players_eliminated;
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub struct GameStatsAnalyser<'a, A> {
    cache: &'a MatchCache<A>,
    top_n: u32,
}

impl<'a, A: MatchApi> GameStatsAnalyser<'a, A> {
    pub fn new(cache: &'a MatchCache<A>) -> Self {
        Self {
            cache,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn top_n(mut self, n: u32) -> Self {
        self.top_n = n;
        self
    }

    /// Fails only when the player or their match list cannot be resolved.
    pub fn analyse(&self, identity: &PlayerIdentity, count: u32) -> Result<GameStats> {
        let account_id = self.cache.get_account_id(identity)?;
        let match_ids = self.cache.get_match_ids(&account_id, count)?;

        let mut totals = Totals::default();
        let mut skipped = 0;
        for match_id in &match_ids {
            match self.participant(&account_id, match_id) {
                Ok(p) => totals.add(&p, self.top_n),
                Err(e) => {
                    warn!(%match_id, error = %e, "match skipped");
                    skipped += 1;
                }
            }
        }

        Ok(self.summarise(identity, match_ids.len(), skipped, &totals))
    }

    fn participant(&self, account_id: &AccountId, match_id: &MatchId) -> Result<ParticipantRecord> {
        self.cache
            .get_participant(account_id, match_id)?
            .ok_or_else(|| Error::ParticipantNotFound {
                account_id: account_id.to_string(),
                match_id: match_id.to_string(),
            })
    }

    fn summarise(
        &self,
        identity: &PlayerIdentity,
        matches: usize,
        skipped: usize,
        totals: &Totals,
    ) -> GameStats {
        let mut stats = GameStats {
            player: identity.to_string(),
            matches,
            skipped,
            top_n: self.top_n,
            top_n_rate: 0.0,
            average_placement: 0.0,
            average_gold_left: 0.0,
            average_game_length: 0,
            average_damage_to_players: 0.0,
            average_players_eliminated: 0.0,
        };
        if matches == 0 {
            return stats;
        }

        let n = matches as f64;
        stats.top_n_rate = round_to(totals.top_n as f64 / n * 100.0, 2);
        stats.average_placement = round_to(totals.placement as f64 / n, 2);
        stats.average_gold_left = round_to(totals.gold_left as f64 / n, 2);
        stats.average_game_length = (totals.time_eliminated / n).max(0.0) as u64;
        stats.average_damage_to_players = round_to(totals.damage as f64 / n, 2);
        stats.average_players_eliminated = round_to(totals.eliminated as f64 / n, 2);
        stats
    }
}

impl fmt::Display for GameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matches == 0 {
            return writeln!(f, "No recent games found for {}.", self.player);
        }

        writeln!(
            f,
            "Game Stats for {} in Recent {} games:",
            self.player, self.matches
        )?;
        if self.skipped > 0 {
            writeln!(
                f,
                "({} of {} games could not be read and count as zero)",
                self.skipped, self.matches
            )?;
        }
        writeln!(f, "Top {} rate: {}%", self.top_n, self.top_n_rate)?;
        writeln!(f, "Average placement: {}", self.average_placement)?;
        writeln!(f, "Average gold left: {}", self.average_gold_left)?;
        writeln!(
            f,
            "Average game length: {} min {} sec",
            self.average_game_length / 60,
            self.average_game_length % 60
        )?;
        writeln!(f, "Average damage to players: {}", self.average_damage_to_players)?;
        write!(
            f,
            "Average players eliminated: {}",
            self.average_players_eliminated
        )
    }
}
