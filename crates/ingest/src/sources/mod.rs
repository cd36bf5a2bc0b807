pub mod wtt;
pub mod youtube;

pub use wtt::WttClient;
