//! Turns analysis payloads into training clips.
//!
//! Match analyses carry `point_losses` / `point_wins`, player analyses carry
//! `scoring_clips` / `losing_clips`. Missing or mistyped fields fall back to defaults.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{ActionLabel, ClipStatus, SourceType, TrainingClip};

/// Window used when a loss or win only carries a display timestamp
const POINT_WINDOW_SECS: f64 = 5.0;
/// Window used for player clips without an end time, roughly one rally
const RALLY_WINDOW_SECS: f64 = 8.0;

const EXACT_MATCH_CONFIDENCE: f64 = 0.9;
const BAD_KEYWORD_CONFIDENCE: f64 = 0.8;
const GOOD_KEYWORD_CONFIDENCE: f64 = 0.7;
const DEFAULT_CONFIDENCE: f64 = 0.6;
const WIN_CONFIDENCE: f64 = 0.95;
const PLAYER_CLIP_CONFIDENCE: f64 = 0.85;

const EXACT_LABELS: &[(&str, ActionLabel)] = &[
    ("正手失誤", ActionLabel::Bad),
    ("反手失誤", ActionLabel::Bad),
    ("發球失誤", ActionLabel::Bad),
    ("接發球失誤", ActionLabel::Bad),
    ("網前失誤", ActionLabel::Bad),
    ("擊球出界", ActionLabel::Bad),
    ("掛網", ActionLabel::Bad),
    ("腳步不到位", ActionLabel::Bad),
    ("判斷失誤", ActionLabel::Bad),
    ("技術失誤", ActionLabel::Bad),
    ("forehand error", ActionLabel::Bad),
    ("backhand error", ActionLabel::Bad),
    ("serve error", ActionLabel::Bad),
    ("receive error", ActionLabel::Bad),
    ("net error", ActionLabel::Bad),
    ("out", ActionLabel::Bad),
    ("footwork", ActionLabel::Bad),
    ("制勝球", ActionLabel::Good),
    ("得分", ActionLabel::Good),
    ("ACE球", ActionLabel::Good),
    ("扣殺得分", ActionLabel::Good),
    ("winner", ActionLabel::Good),
    ("ace", ActionLabel::Good),
    ("smash", ActionLabel::Good),
    ("對手得分", ActionLabel::Normal),
    ("運氣球", ActionLabel::Normal),
    ("opponent winner", ActionLabel::Normal),
    ("lucky ball", ActionLabel::Normal),
];

const BAD_KEYWORDS: &[&str] = &[
    "失誤", "出界", "掛網", "失敗", "錯誤", "不到位", "error", "miss", "fault", "net",
];

const GOOD_KEYWORDS: &[&str] = &["得分", "制勝", "ace", "扣殺", "漂亮", "winner", "point"];

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub auto_approve: bool,
    pub confidence_threshold: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            auto_approve: false,
            confidence_threshold: 0.7,
        }
    }
}

impl ImportOptions {
    fn initial_status(&self, confidence: f64) -> ClipStatus {
        if self.auto_approve && confidence >= self.confidence_threshold {
            ClipStatus::Approved
        } else {
            ClipStatus::Pending
        }
    }
}

#[derive(Debug, Default)]
pub struct PlayerImport {
    pub clips: Vec<TrainingClip>,
    pub scoring_count: usize,
    pub losing_count: usize,
}

impl PlayerImport {
    pub fn label_stats(&self) -> BTreeMap<String, usize> {
        let mut stats: BTreeMap<String, usize> = ActionLabel::ALL
            .iter()
            .map(|l| (l.as_str().to_string(), 0))
            .collect();
        for clip in &self.clips {
            *stats.entry(clip.label.as_str().to_string()).or_default() += 1;
        }
        stats
    }
}

/// Parses `m:ss`, `h:mm:ss` or plain seconds. A full-width colon is
/// accepted. Anything unparsable is 0.
pub fn parse_timestamp(timestamp: &str) -> f64 {
    let normalized = timestamp.trim().replace('：', ":");
    let parts: Vec<&str> = normalized.split(':').map(str::trim).collect();

    let parsed = match parts.as_slice() {
        [minutes, seconds] => minutes
            .parse::<u32>()
            .ok()
            .zip(seconds.parse::<f64>().ok())
            .map(|(m, s)| m as f64 * 60.0 + s),
        [hours, minutes, seconds] => match (
            hours.parse::<u32>(),
            minutes.parse::<u32>(),
            seconds.parse::<f64>(),
        ) {
            (Ok(h), Ok(m), Ok(s)) => Some(h as f64 * 3600.0 + m as f64 * 60.0 + s),
            _ => None,
        },
        [seconds] => seconds.parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

/// Label and confidence for an error type and its description.
pub fn infer_label(error_type: &str, description: &str) -> (ActionLabel, f64) {
    let trimmed = error_type.trim();
    if let Some((_, label)) = EXACT_LABELS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(trimmed))
    {
        return (*label, EXACT_MATCH_CONFIDENCE);
    }

    let combined = format!("{} {}", trimmed.to_lowercase(), description.to_lowercase());

    if BAD_KEYWORDS.iter().any(|kw| combined.contains(kw)) {
        return (ActionLabel::Bad, BAD_KEYWORD_CONFIDENCE);
    }

    if GOOD_KEYWORDS.iter().any(|kw| combined.contains(kw)) {
        return (ActionLabel::Good, GOOD_KEYWORD_CONFIDENCE);
    }

    (ActionLabel::Bad, DEFAULT_CONFIDENCE)
}

fn str_field<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn num_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn point_window(point: &Value) -> (f64, f64) {
    if let (Some(start), Some(end)) = (num_field(point, "start_seconds"), num_field(point, "end_seconds")) {
        return (start, end.max(start));
    }

    let start = str_field(point, &["timestamp_display", "timestamp"])
        .map(parse_timestamp)
        .unwrap_or(0.0);
    (start, start + POINT_WINDOW_SECS)
}

fn video_url(analysis: &Value) -> String {
    str_field(analysis, &["video_url", "url"])
        .unwrap_or_default()
        .to_string()
}

fn array<'v>(analysis: &'v Value, key: &str) -> &'v [Value] {
    analysis
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Lost points become `bad` clips, won points `good` clips.
pub fn clips_from_match_analysis(analysis: &Value, options: ImportOptions) -> Vec<TrainingClip> {
    let source = video_url(analysis);
    let mut clips = Vec::new();

    for point in array(analysis, "point_losses") {
        let (start, end) = point_window(point);
        let error_type = str_field(point, &["loss_type", "error_type"]).unwrap_or_default();
        let description = str_field(point, &["description"]).unwrap_or_default();

        let (mut label, mut confidence) = infer_label(error_type, description);
        // a lost point is never a neutral sample
        if label == ActionLabel::Normal {
            label = ActionLabel::Bad;
            confidence = EXACT_MATCH_CONFIDENCE;
        }

        let mut clip = TrainingClip::new(&source, SourceType::Youtube, start, end, label, confidence);
        clip.description = format!("[loss] {}: {}", error_type, description);
        clip.error_type = Some(error_type.to_string()).filter(|s| !s.is_empty());
        clip.status = options.initial_status(confidence);
        clips.push(clip);
    }

    for point in array(analysis, "point_wins") {
        let (start, end) = point_window(point);
        let win_type = str_field(point, &["win_type"]).unwrap_or_default();
        let description = str_field(point, &["description"]).unwrap_or_default();

        let mut clip = TrainingClip::new(
            &source,
            SourceType::Youtube,
            start,
            end,
            ActionLabel::Good,
            WIN_CONFIDENCE,
        );
        clip.description = format!("[win] {}: {}", win_type, description);
        clip.status = options.initial_status(WIN_CONFIDENCE);
        clips.push(clip);
    }

    clips
}

pub fn clips_from_player_analysis(
    analysis: &Value,
    player_name: &str,
    options: ImportOptions,
) -> PlayerImport {
    let source = video_url(analysis);
    let mut import = PlayerImport::default();

    for item in array(analysis, "scoring_clips") {
        import
            .clips
            .push(performance_clip(item, &source, player_name, true, options));
        import.scoring_count += 1;
    }

    for item in array(analysis, "losing_clips") {
        import
            .clips
            .push(performance_clip(item, &source, player_name, false, options));
        import.losing_count += 1;
    }

    import
}

fn performance_clip(
    item: &Value,
    source: &str,
    player_name: &str,
    scoring: bool,
    options: ImportOptions,
) -> TrainingClip {
    let start = num_field(item, "start_seconds")
        .or_else(|| str_field(item, &["timestamp"]).map(parse_timestamp))
        .unwrap_or(0.0);
    let end = num_field(item, "end_seconds")
        .unwrap_or(start + RALLY_WINDOW_SECS)
        .max(start);

    let label = str_field(item, &["quality_label"])
        .and_then(ActionLabel::parse)
        .unwrap_or(if scoring { ActionLabel::Good } else { ActionLabel::Bad });

    let technique = str_field(item, &["technique"]).unwrap_or_default();

    let mut description = format!(
        "[{}] {} - {}",
        player_name,
        if scoring { "scored" } else { "lost" },
        technique
    );
    if let Some(reason) = str_field(item, &["quality_reason"]) {
        description.push_str(&format!(" ({})", reason));
    }
    if let Some(detail) = str_field(item, &["description"]) {
        description.push_str(&format!(" | {}", detail));
    }

    let mut clip = TrainingClip::new(
        source,
        SourceType::Youtube,
        start,
        end,
        label,
        PLAYER_CLIP_CONFIDENCE,
    );
    clip.description = description;
    clip.error_type = (!scoring && !technique.is_empty()).then(|| technique.to_string());
    clip.status = options.initial_status(PLAYER_CLIP_CONFIDENCE);
    clip
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1:05"), 65.0);
        assert_eq!(parse_timestamp("1:02:03"), 3723.0);
        assert_eq!(parse_timestamp("2：30"), 150.0);
        assert_eq!(parse_timestamp("42.5"), 42.5);
        assert_eq!(parse_timestamp("soon"), 0.0);
        assert_eq!(parse_timestamp("1:2:3:4"), 0.0);
    }

    #[test]
    fn test_infer_label_rules() {
        assert_eq!(infer_label("掛網", ""), (ActionLabel::Bad, 0.9));
        assert_eq!(infer_label("制勝球", ""), (ActionLabel::Good, 0.9));
        assert_eq!(infer_label("運氣球", ""), (ActionLabel::Normal, 0.9));
        assert_eq!(infer_label("long push", "ball went into the net"), (ActionLabel::Bad, 0.8));
        assert_eq!(infer_label("third ball", "clean winner down the line"), (ActionLabel::Good, 0.7));
        assert_eq!(infer_label("rally", "long exchange"), (ActionLabel::Bad, 0.6));
    }

    #[test]
    fn test_match_import_labels_and_windows() {
        let analysis = json!({
            "video_url": "https://youtu.be/abc",
            "point_losses": [
                {"loss_type": "運氣球", "description": "edge ball", "start_seconds": 10, "end_seconds": 16},
                {"loss_type": "backhand error", "timestamp_display": "1:30"}
            ],
            "point_wins": [
                {"win_type": "forehand loop", "description": "cross court", "timestamp": "2:00"}
            ]
        });

        let clips = clips_from_match_analysis(&analysis, ImportOptions::default());
        assert_eq!(clips.len(), 3);

        // normal loss forced to bad
        assert_eq!(clips[0].label, ActionLabel::Bad);
        assert_eq!(clips[0].label_confidence, 0.9);
        assert_eq!((clips[0].start_time, clips[0].end_time), (10.0, 16.0));
        assert_eq!(clips[0].description, "[loss] 運氣球: edge ball");

        assert_eq!((clips[1].start_time, clips[1].end_time), (90.0, 95.0));

        assert_eq!(clips[2].label, ActionLabel::Good);
        assert_eq!(clips[2].label_confidence, 0.95);
        assert!(clips[2].error_type.is_none());

        assert!(clips.iter().all(|c| c.status == ClipStatus::Pending));
        assert!(clips.iter().all(|c| c.source_video == "https://youtu.be/abc"));
    }

    #[test]
    fn test_auto_approve_respects_threshold() {
        let analysis = json!({
            "point_losses": [
                {"loss_type": "rally", "description": "long exchange"},
                {"loss_type": "掛網", "description": ""}
            ]
        });
        let options = ImportOptions {
            auto_approve: true,
            confidence_threshold: 0.7,
        };

        let clips = clips_from_match_analysis(&analysis, options);
        assert_eq!(clips[0].status, ClipStatus::Pending);
        assert_eq!(clips[1].status, ClipStatus::Approved);
    }

    #[test]
    fn test_player_import() {
        let analysis = json!({
            "video_url": "https://youtu.be/xyz",
            "scoring_clips": [
                {"start_seconds": 5.0, "technique": "loop", "quality_label": "good"},
                {"timestamp": "0:40", "technique": "flick", "quality_label": "excellent"}
            ],
            "losing_clips": [
                {"start_seconds": 70.0, "end_seconds": 74.0, "technique": "push", "quality_reason": "too high"}
            ]
        });

        let import = clips_from_player_analysis(&analysis, "Lin Yun-Ju", ImportOptions::default());
        assert_eq!(import.scoring_count, 2);
        assert_eq!(import.losing_count, 1);

        assert_eq!(import.clips[0].end_time, 13.0);
        assert_eq!(import.clips[1].start_time, 40.0);
        assert_eq!(import.clips[1].label, ActionLabel::Good);
        assert_eq!(import.clips[2].label, ActionLabel::Bad);
        assert_eq!(import.clips[2].error_type.as_deref(), Some("push"));
        assert_eq!(import.clips[2].description, "[Lin Yun-Ju] lost - push (too high)");

        let stats = import.label_stats();
        assert_eq!(stats["good"], 2);
        assert_eq!(stats["bad"], 1);
        assert_eq!(stats["normal"], 0);
    }

    #[test]
    fn test_missing_arrays_import_nothing() {
        let clips = clips_from_match_analysis(&json!({"summary": "no points"}), ImportOptions::default());
        assert!(clips.is_empty());
    }
}
