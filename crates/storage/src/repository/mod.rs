pub mod analysis;
pub mod clip;
pub mod match_record;
pub mod profile;
pub mod ranking;
