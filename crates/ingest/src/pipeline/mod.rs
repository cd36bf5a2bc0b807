//! Turns approved clips into training samples: trimmed video, skeleton
//! sequence and the per-label folders the trainer reads.

pub mod clip_processor;
pub mod export;

use std::path::{Path, PathBuf};

pub use clip_processor::ClipProcessor;
pub use export::export_clips;

/// On-disk layout under `{data_dir}/training_clips`.
#[derive(Debug, Clone)]
pub struct ClipLayout {
    root: PathBuf,
}

impl ClipLayout {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("training_clips"),
        }
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    pub fn video_path(&self, clip_id: &str) -> PathBuf {
        self.videos_dir().join(format!("{}.mp4", clip_id))
    }

    /// Trim target, renamed to [`video_path`](Self::video_path) once the cut succeeds
    pub fn partial_video_path(&self, clip_id: &str) -> PathBuf {
        self.videos_dir().join(format!("{}.part.mp4", clip_id))
    }

    /// Full source download, removed once the clip is cut
    pub fn download_path(&self, clip_id: &str) -> PathBuf {
        self.videos_dir().join(format!("temp_{}.mp4", clip_id))
    }

    pub fn skeleton_path(&self, clip_id: &str) -> PathBuf {
        self.root.join("skeletons").join(clip_id).join("skeleton.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = ClipLayout::new("/srv/data");
        assert_eq!(layout.video_path("ab12cd34"), Path::new("/srv/data/training_clips/videos/ab12cd34.mp4"));
        assert_eq!(
            layout.skeleton_path("ab12cd34"),
            Path::new("/srv/data/training_clips/skeletons/ab12cd34/skeleton.json")
        );
        assert_eq!(
            layout.partial_video_path("ab12cd34"),
            Path::new("/srv/data/training_clips/videos/ab12cd34.part.mp4")
        );
    }
}
