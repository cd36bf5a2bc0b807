pub mod analysis;
pub mod auto_train;
pub mod common;
pub mod prediction;
pub mod profile;
pub mod ranking;
pub mod training;
