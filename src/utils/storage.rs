use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, PlayerIdentity};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const SCHEMA_VERSION: i32 = 1;

/// Durable index mapping Riot IDs to account ids and match ids to cache
/// locators. Every insert is first-write-wins.
#[derive(Debug)]
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_info (
                game_name TEXT NOT NULL,
                tag_line TEXT NOT NULL,
                puuid TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(game_name, tag_line)
            );

            CREATE TABLE IF NOT EXISTS match_cache (
                match_id TEXT PRIMARY KEY,
                cache_path TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );
            "#,
        )?;

        let version: Option<i32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        match version {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) => {
                return Err(Error::Config(format!(
                    "index schema version {v} is not supported (expected {SCHEMA_VERSION})"
                )));
            }
        }

        Ok(Self { conn })
    }

    pub fn find_account_id(&self, identity: &PlayerIdentity) -> Result<Option<AccountId>> {
        let puuid: Option<String> = self
            .conn
            .query_row(
                "SELECT puuid FROM player_info WHERE game_name = ?1 AND tag_line = ?2",
                params![identity.game_name, identity.tag_line],
                |row| row.get(0),
            )
            .optional()?;
        Ok(puuid.map(AccountId::new))
    }

    /// No effect if the identity is already recorded.
    pub fn record_account_id(&self, identity: &PlayerIdentity, id: &AccountId) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT INTO player_info (game_name, tag_line, puuid, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(game_name, tag_line) DO NOTHING",
            params![
                identity.game_name,
                identity.tag_line,
                id.as_str(),
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        if inserted == 0 {
            tracing::debug!(%identity, "account id already indexed, keeping first value");
        }
        Ok(())
    }

    pub fn find_cache_location(&self, match_id: &MatchId) -> Result<Option<String>> {
        let locator = self
            .conn
            .query_row(
                "SELECT cache_path FROM match_cache WHERE match_id = ?1",
                params![match_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(locator)
    }

    /// No effect if the match is already recorded.
    pub fn record_cache_location(&self, match_id: &MatchId, locator: &str) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT INTO match_cache (match_id, cache_path, cached_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(match_id) DO NOTHING",
            params![match_id.as_str(), locator, chrono::Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            tracing::debug!(%match_id, "match already indexed, keeping first locator");
        }
        Ok(())
    }

    pub fn cached_match_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM match_cache", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn identity() -> PlayerIdentity {
        PlayerIdentity::new("Foo", "000")
    }

    #[test]
    fn read_miss_is_none() {
        let index = IndexStore::open_in_memory().unwrap();
        assert!(index.find_account_id(&identity()).unwrap().is_none());
        let m = MatchId::new("m1").unwrap();
        assert!(index.find_cache_location(&m).unwrap().is_none());
    }

    #[test]
    fn first_account_id_wins() {
        let index = IndexStore::open_in_memory().unwrap();
        index.record_account_id(&identity(), &AccountId::new("P1")).unwrap();
        index.record_account_id(&identity(), &AccountId::new("P2")).unwrap();

        assert_eq!(
            index.find_account_id(&identity()).unwrap(),
            Some(AccountId::new("P1"))
        );
    }

    #[test]
    fn identity_is_keyed_on_both_parts() {
        let index = IndexStore::open_in_memory().unwrap();
        index.record_account_id(&identity(), &AccountId::new("P1")).unwrap();
        assert!(index
            .find_account_id(&PlayerIdentity::new("Foo", "001"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn first_locator_wins() {
        let index = IndexStore::open_in_memory().unwrap();
        let m = MatchId::new("NA1_1").unwrap();
        index.record_cache_location(&m, "NA1_1.json").unwrap();
        index.record_cache_location(&m, "other.json").unwrap();

        assert_eq!(
            index.find_cache_location(&m).unwrap().as_deref(),
            Some("NA1_1.json")
        );
        assert_eq!(index.cached_match_count().unwrap(), 1);
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let m = MatchId::new("NA1_2").unwrap();

        {
            let index = IndexStore::open(&path).unwrap();
            index.record_account_id(&identity(), &AccountId::new("P9")).unwrap();
            index.record_cache_location(&m, "NA1_2.json").unwrap();
        }

        let index = IndexStore::open(&path).unwrap();
        assert_eq!(
            index.find_account_id(&identity()).unwrap(),
            Some(AccountId::new("P9"))
        );
        assert_eq!(
            index.find_cache_location(&m).unwrap().as_deref(),
            Some("NA1_2.json")
        );
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.db");
        {
            let index = IndexStore::open(&path).unwrap();
            index
                .conn
                .execute("UPDATE schema_version SET version = 99", [])
                .unwrap();
        }
        let err = IndexStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
