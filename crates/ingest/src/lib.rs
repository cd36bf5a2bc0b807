pub mod error;
pub mod extractors;
pub mod media;
pub mod pipeline;
pub mod pose;
pub mod sources;
pub mod trainer;
pub mod traits;

pub use error::{IngestError, Result};
pub use traits::{InlineData, MediaToolkit, PoseEstimator, RankingSource, Trainer, VideoMetadata, VisionModel};
