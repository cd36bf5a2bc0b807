use std::path::{Path, PathBuf};

use storage::dto::auto_train::ExportCounts;
use storage::models::{ActionLabel, ClipStatus, SourceType, TrainingClip};

use super::ClipLayout;
use crate::error::Result;

enum Source {
    Ready(PathBuf),
    Missing,
    Skip,
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Which file feeds the training folder. Processed clips use their cut
/// video; approved local clips fall back to the source file.
async fn source_for(clip: &TrainingClip, layout: &ClipLayout) -> Source {
    let cut = layout.video_path(&clip.clip_id);

    match clip.status {
        ClipStatus::Processed if exists(&cut).await => Source::Ready(cut),
        ClipStatus::Processed => Source::Missing,
        ClipStatus::Approved if exists(&cut).await => Source::Ready(cut),
        ClipStatus::Approved if clip.source_type == SourceType::Local => {
            let local = PathBuf::from(&clip.source_video);
            if exists(&local).await {
                Source::Ready(local)
            } else {
                Source::Missing
            }
        }
        ClipStatus::Approved => Source::Skip,
        ClipStatus::Pending | ClipStatus::Rejected => Source::Skip,
    }
}

/// Deletes copies left in other label folders by an earlier export.
async fn remove_stale(clip_id: &str, label: ActionLabel, training_dir: &Path) -> Result<()> {
    for other in ActionLabel::ALL.into_iter().filter(|l| *l != label) {
        let folder = training_dir.join(other.training_folder());

        let video = folder.join(format!("{}.mp4", clip_id));
        if exists(&video).await {
            tokio::fs::remove_file(&video).await?;
        }

        let skeleton_dir = folder.join(clip_id);
        if exists(&skeleton_dir).await {
            tokio::fs::remove_dir_all(&skeleton_dir).await?;
        }
    }
    Ok(())
}

async fn export_one(clip: &TrainingClip, video: &Path, training_dir: &Path) -> Result<()> {
    let folder = training_dir.join(clip.label.training_folder());
    tokio::fs::create_dir_all(&folder).await?;

    remove_stale(&clip.clip_id, clip.label, training_dir).await?;
    tokio::fs::copy(video, folder.join(format!("{}.mp4", clip.clip_id))).await?;

    if let Some(skeleton) = clip.skeleton_path.as_deref().map(Path::new)
        && exists(skeleton).await
    {
        let dir = folder.join(&clip.clip_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::copy(skeleton, dir.join("skeleton.json")).await?;
    }

    Ok(())
}

/// Copies exportable clips into `{training_dir}/{label}_input_movid`.
/// Pending and rejected clips are ignored; approved clips without a video
/// are counted as skipped.
pub async fn export_clips(clips: &[TrainingClip], layout: &ClipLayout, training_dir: &Path) -> ExportCounts {
    let mut counts = ExportCounts::default();

    for clip in clips {
        let video = match source_for(clip, layout).await {
            Source::Ready(path) => path,
            Source::Skip => {
                if clip.status == ClipStatus::Approved {
                    counts.skipped += 1;
                }
                continue;
            }
            Source::Missing => {
                tracing::warn!("No video found for clip {}", clip.clip_id);
                counts.errors += 1;
                continue;
            }
        };

        match export_one(clip, &video, training_dir).await {
            Ok(()) => counts.record(clip.label),
            Err(e) => {
                tracing::warn!("Failed to export clip {}: {}", clip.clip_id, e);
                counts.errors += 1;
            }
        }
    }

    tracing::info!(
        "Exported {} clips to {} ({} skipped, {} errors)",
        counts.exported(),
        training_dir.display(),
        counts.skipped,
        counts.errors
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(status: ClipStatus, source_type: SourceType, source: &str, label: ActionLabel) -> TrainingClip {
        let mut clip = TrainingClip::new(source, source_type, 0.0, 4.0, label, 0.9);
        clip.status = status;
        clip
    }

    fn processed(layout: &ClipLayout, label: ActionLabel) -> TrainingClip {
        let mut clip = clip(ClipStatus::Processed, SourceType::Youtube, "https://youtu.be/abc", label);
        let video = layout.video_path(&clip.clip_id);
        std::fs::create_dir_all(video.parent().unwrap()).unwrap();
        std::fs::write(&video, b"clip").unwrap();

        let skeleton = layout.skeleton_path(&clip.clip_id);
        std::fs::create_dir_all(skeleton.parent().unwrap()).unwrap();
        std::fs::write(&skeleton, b"{}").unwrap();
        clip.skeleton_path = Some(skeleton.to_string_lossy().into_owned());
        clip
    }

    fn count_files(dir: &Path) -> usize {
        walk(dir).len()
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .flat_map(|e| {
                let path = e.path();
                if path.is_dir() { walk(&path) } else { vec![path] }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_export_layout_and_counts() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let layout = ClipLayout::new(data.path());

        let local_file = data.path().join("rally.mp4");
        std::fs::write(&local_file, b"local").unwrap();

        let done = processed(&layout, ActionLabel::Good);
        let clips = vec![
            done.clone(),
            clip(ClipStatus::Approved, SourceType::Local, &local_file.to_string_lossy(), ActionLabel::Bad),
            clip(ClipStatus::Approved, SourceType::Youtube, "https://youtu.be/xyz", ActionLabel::Bad),
            clip(ClipStatus::Pending, SourceType::Youtube, "https://youtu.be/xyz", ActionLabel::Good),
            clip(ClipStatus::Approved, SourceType::Local, "/nowhere/missing.mp4", ActionLabel::Normal),
        ];

        let counts = export_clips(&clips, &layout, out.path()).await;

        assert_eq!(
            counts,
            ExportCounts {
                good: 1,
                normal: 0,
                bad: 1,
                skipped: 1,
                errors: 1,
            }
        );

        let good = out.path().join("good_input_movid");
        assert!(good.join(format!("{}.mp4", done.clip_id)).exists());
        assert!(good.join(&done.clip_id).join("skeleton.json").exists());
        assert!(out.path().join("bad_input_movid").join(format!("{}.mp4", clips[1].clip_id)).exists());
    }

    #[tokio::test]
    async fn test_export_is_idempotent() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let layout = ClipLayout::new(data.path());
        let clips = vec![processed(&layout, ActionLabel::Normal), processed(&layout, ActionLabel::Bad)];

        let first = export_clips(&clips, &layout, out.path()).await;
        let files = walk(out.path());
        let second = export_clips(&clips, &layout, out.path()).await;

        assert_eq!(first, second);
        let mut again = walk(out.path());
        let mut files = files;
        files.sort();
        again.sort();
        assert_eq!(files, again);
    }

    #[tokio::test]
    async fn test_relabel_leaves_single_copy() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let layout = ClipLayout::new(data.path());
        let mut clip = processed(&layout, ActionLabel::Bad);

        export_clips(std::slice::from_ref(&clip), &layout, out.path()).await;
        clip.label = ActionLabel::Good;
        export_clips(std::slice::from_ref(&clip), &layout, out.path()).await;

        assert_eq!(count_files(&out.path().join("bad_input_movid")), 0);
        assert_eq!(count_files(&out.path().join("good_input_movid")), 2);
    }
}
