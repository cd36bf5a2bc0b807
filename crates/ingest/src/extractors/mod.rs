pub mod analyzer;
pub mod gemini_client;
pub mod indicators;
pub mod keyframes;
pub mod match_report;
pub mod prompts;

pub use analyzer::{FailureAnalyzer, MatchAnalysis, MatchAnalyzer, PlayerAnalysis};
pub use gemini_client::GeminiClient;
pub use prompts::PlayerFocus;
