pub mod analysis;
pub mod auto_train;
pub mod health;
pub mod players;
pub mod predict;
pub mod profiles;
pub mod ranking;
pub mod training;
pub mod youtube;
