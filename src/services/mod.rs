pub mod api;
pub mod cache;
pub mod stats;

pub use api::RiotClient;
pub use cache::{MatchCache, Source};
pub use stats::GameStatsAnalyser;
