use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, MatchRecord, ParticipantRecord, PlayerIdentity};
use crate::services::api::MatchApi;
use crate::utils::{BlobCache, IndexStore};
use tracing::{debug, info, warn};

/// Where a match payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Remote,
}

/// Read-through cache in front of the remote API. Account ids and match
/// payloads are fetched at most once and persisted; match lists are always
/// fetched fresh.
pub struct MatchCache<A> {
    api: A,
    index: IndexStore,
    blobs: BlobCache,
}

impl<A: MatchApi> MatchCache<A> {
    pub fn new(api: A, index: IndexStore, blobs: BlobCache) -> Self {
        Self { api, index, blobs }
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn get_account_id(&self, identity: &PlayerIdentity) -> Result<AccountId> {
        if let Some(id) = self.index.find_account_id(identity)? {
            debug!(%identity, "account id served from index");
            return Ok(id);
        }

        info!(%identity, "resolving account id from remote");
        let id = self.api.resolve_identity(identity)?;
        if id.is_empty() {
            warn!(%identity, "remote returned an empty account id");
            return Err(Error::IdentityNotFound {
                game_name: identity.game_name.clone(),
                tag_line: identity.tag_line.clone(),
            });
        }

        self.index.record_account_id(identity, &id)?;
        Ok(id)
    }

    pub fn get_match_ids(&self, account_id: &AccountId, count: u32) -> Result<Vec<MatchId>> {
        let ids = self.api.list_recent_matches(account_id, count)?;
        debug!(%account_id, requested = count, received = ids.len(), "listed recent matches");
        Ok(ids)
    }

    pub fn get_match(&self, match_id: &MatchId) -> Result<MatchRecord> {
        self.get_match_with_source(match_id).map(|(record, _)| record)
    }

    pub fn get_match_with_source(&self, match_id: &MatchId) -> Result<(MatchRecord, Source)> {
        if let Some(locator) = self.index.find_cache_location(match_id)? {
            return self.load_cached(match_id, locator).map(|r| (r, Source::Cache));
        }

        info!(%match_id, "fetching match from remote");
        let record = self.api.fetch_match(match_id)?;

        // Blob first: the index must only ever point at a verified payload.
        let locator = self.blobs.store(match_id, record.bytes())?;
        self.index.record_cache_location(match_id, &locator)?;
        info!(%match_id, %locator, "match cached");

        Ok((record, Source::Remote))
    }

    fn load_cached(&self, match_id: &MatchId, locator: String) -> Result<MatchRecord> {
        let bytes = self.blobs.load(&locator).map_err(|e| {
            warn!(%match_id, %locator, error = %e, "indexed payload cannot be loaded");
            Error::CacheCorruption {
                match_id: match_id.to_string(),
                locator: locator.clone(),
            }
        })?;

        let record = MatchRecord::from_bytes(bytes).map_err(|e| {
            warn!(%match_id, %locator, error = %e, "indexed payload is unreadable");
            Error::CacheCorruption {
                match_id: match_id.to_string(),
                locator: locator.clone(),
            }
        })?;
        debug!(%match_id, %locator, "match served from cache");
        Ok(record)
    }

    /// The participant entry for `account_id`, or `None` when the match has
    /// no such player.
    pub fn get_participant(
        &self,
        account_id: &AccountId,
        match_id: &MatchId,
    ) -> Result<Option<ParticipantRecord>> {
        let record = self.get_match(match_id)?;
        let participant = record.participant(account_id)?;
        if participant.is_none() {
            warn!(%account_id, %match_id, "player not among match participants");
        }
        Ok(participant)
    }
}
