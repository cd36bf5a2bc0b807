mod analysis_record;
mod match_record;
mod normalized_name;
mod player_profile;
mod ranking_snapshot;
mod roster_player;
mod training_clip;

pub use analysis_record::AnalysisRecord;
pub use match_record::{MatchRecord, MatchSide};
pub use normalized_name::{NameMatch, PlayerId, match_name};
pub use player_profile::{MatchHistoryEntry, PlayerProfile, RATING_KEYS, aggregate_ratings};
pub use ranking_snapshot::{RankingCategory, RankingSnapshot};
pub use roster_player::{Gender, PlayStyle, RosterPlayer};
pub use training_clip::{ActionLabel, ClipStatus, SourceType, TrainingClip, new_short_id};
