pub mod clip_import;
pub mod clip_stats;
pub mod prediction;
pub mod roster;
pub mod tactics;
