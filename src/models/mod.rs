pub mod types;

pub use types::{AccountId, MatchId, MatchRecord, ParticipantRecord, PlayerIdentity};
