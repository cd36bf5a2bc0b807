use std::collections::BTreeMap;

use crate::dto::auto_train::ClipStatistics;
use crate::models::{ActionLabel, ClipStatus, SourceType, TrainingClip};

/// Counts per status, label and source. Every known status and label is
/// present even when zero, so the per-key sums always equal `total`.
pub fn summarize(clips: &[TrainingClip]) -> ClipStatistics {
    let mut by_status: BTreeMap<String, usize> = ClipStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_label: BTreeMap<String, usize> = ActionLabel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    let mut by_source: BTreeMap<String, usize> =
        [("youtube".to_string(), 0), ("local".to_string(), 0)].into_iter().collect();

    for clip in clips {
        *by_status.entry(clip.status.as_str().to_string()).or_default() += 1;
        *by_label.entry(clip.label.as_str().to_string()).or_default() += 1;
        let source = match clip.source_type {
            SourceType::Youtube => "youtube",
            SourceType::Local => "local",
        };
        *by_source.entry(source.to_string()).or_default() += 1;
    }

    ClipStatistics {
        total: clips.len(),
        by_status,
        by_label,
        by_source,
    }
}
