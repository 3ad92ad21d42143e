use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Riot ID of a player, e.g. `Manon Win#236KK`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerIdentity {
    pub game_name: String,
    pub tag_line: String,
}

impl PlayerIdentity {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

impl FromStr for PlayerIdentity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.rsplit_once('#') {
            Some((name, tag)) if !name.trim().is_empty() && !tag.trim().is_empty() => {
                Ok(PlayerIdentity::new(name.trim(), tag.trim()))
            }
            _ => Err(format!("expected NAME#TAG, got '{s}'")),
        }
    }
}

/// Opaque player id (puuid) issued by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match identifier, e.g. `NA1_5123456789`. Restricted to characters that are
/// safe to use verbatim as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidArgument(format!("invalid match id '{id}'")));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MatchId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        MatchId::new(value)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full match payload as returned by the remote service. The raw bytes are
/// kept so that a cached copy is byte-identical to what was fetched.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    bytes: Vec<u8>,
    document: Value,
}

impl MatchRecord {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let document = serde_json::from_slice(&bytes)?;
        Ok(Self { bytes, document })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entries of `info.participants`; empty when the payload has none.
    pub fn participants(&self) -> &[Value] {
        self.document
            .pointer("/info/participants")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Linear scan for the participant whose `puuid` equals `account_id`.
    pub fn participant(&self, account_id: &AccountId) -> Result<Option<ParticipantRecord>> {
        let found = self.participants().iter().find(|p| {
            p.get("puuid").and_then(Value::as_str) == Some(account_id.as_str())
        });
        match found {
            Some(value) => Ok(Some(ParticipantRecord::deserialize(value)?)),
            None => Ok(None),
        }
    }
}

impl PartialEq for MatchRecord {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

/// Per-player slice of a match. Unlisted fields of the payload are kept in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub puuid: AccountId,
    pub placement: u32,
    #[serde(default)]
    pub gold_left: i64,
    #[serde(default)]
    pub time_eliminated: f64,
    #[serde(default)]
    pub total_damage_to_players: i64,
    #[serde(default)]
    pub players_eliminated: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
