use std::collections::BTreeMap;
use std::path::Path;

use ingest::pipeline::{ClipLayout, export_clips};
use storage::{
    Database,
    dto::auto_train::{
        ApproveClipRequest, BatchSummary, ClipOutcome, ExportCounts, ImportAnalysisRequest, ImportPlayerAnalysisRequest,
        ImportResponse, TrainingBatchItem, TrainingBatchResponse,
    },
    models::{ActionLabel, ClipStatus, TrainingClip},
    repository::clip::ClipRepository,
    services::clip_import::{self, ImportOptions},
};

use crate::error::{WebError, WebResult};

pub fn parse_status(status: Option<&str>) -> WebResult<Option<ClipStatus>> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => ClipStatus::parse(s)
            .map(Some)
            .ok_or_else(|| WebError::BadRequest(format!("Unknown clip status: {}", s))),
    }
}

pub fn parse_label(label: Option<&str>) -> WebResult<Option<ActionLabel>> {
    match label.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(l) => ActionLabel::parse(l)
            .map(Some)
            .ok_or_else(|| WebError::BadRequest(format!("Unknown label: {}", l))),
    }
}

/// An empty body approves without relabeling. Anything else must be a valid
/// [`ApproveClipRequest`].
pub fn parse_approve_body(body: &[u8]) -> WebResult<ApproveClipRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApproveClipRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| WebError::BadRequest(format!("Invalid approve body: {}", e)))
}

pub async fn import_match(db: &Database, req: &ImportAnalysisRequest) -> WebResult<ImportResponse> {
    let options = ImportOptions {
        auto_approve: req.auto_approve,
        confidence_threshold: req.confidence_threshold,
    };

    let clips = clip_import::clips_from_match_analysis(&req.analysis_result, options);
    ClipRepository::new(db.pool()).insert_many(&clips).await?;
    tracing::info!("Imported {} clips from match analysis", clips.len());

    Ok(ImportResponse {
        success: true,
        imported_count: clips.len(),
        clips,
        scoring_count: None,
        losing_count: None,
        label_stats: None,
    })
}

pub async fn import_player(db: &Database, req: &ImportPlayerAnalysisRequest) -> WebResult<ImportResponse> {
    let options = ImportOptions {
        auto_approve: req.auto_approve,
        confidence_threshold: req.confidence_threshold,
    };

    let import = clip_import::clips_from_player_analysis(&req.analysis_result, &req.player_name, options);
    ClipRepository::new(db.pool()).insert_many(&import.clips).await?;
    tracing::info!(
        "Imported {} clips for {} ({} scoring, {} losing)",
        import.clips.len(),
        req.player_name,
        import.scoring_count,
        import.losing_count
    );

    let label_stats = import.label_stats();
    Ok(ImportResponse {
        success: true,
        imported_count: import.clips.len(),
        scoring_count: Some(import.scoring_count),
        losing_count: Some(import.losing_count),
        label_stats: Some(label_stats),
        clips: import.clips,
    })
}

/// Approves each clip on its own so one bad id does not stop the batch.
pub async fn approve_batch(db: &Database, clip_ids: &[String], label: Option<ActionLabel>) -> BatchSummary {
    let repo = ClipRepository::new(db.pool());

    let mut outcomes = Vec::with_capacity(clip_ids.len());
    for clip_id in clip_ids {
        let outcome = match repo.approve(clip_id, label).await {
            Ok(_) => ClipOutcome::success(clip_id),
            Err(e) => ClipOutcome::failed(clip_id, e.to_string()),
        };
        outcomes.push(outcome);
    }

    BatchSummary::from_outcomes(outcomes)
}

pub async fn export(db: &Database, layout: &ClipLayout, training_dir: &Path) -> WebResult<ExportCounts> {
    let clips = ClipRepository::new(db.pool()).list(None).await?;
    Ok(export_clips(&clips, layout, training_dir).await)
}

/// Processed clips with a skeleton, optionally limited to one label.
pub fn training_batch(clips: Vec<TrainingClip>, label: Option<ActionLabel>) -> TrainingBatchResponse {
    let mut counts: BTreeMap<String, usize> = ActionLabel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();

    let items: Vec<TrainingBatchItem> = clips
        .into_iter()
        .filter(|c| c.status == ClipStatus::Processed)
        .filter(|c| label.is_none_or(|l| c.label == l))
        .filter_map(|c| {
            let duration = c.duration();
            let skeleton_path = c.skeleton_path?;
            Some(TrainingBatchItem {
                clip_id: c.clip_id,
                label: c.label,
                skeleton_path,
                duration,
            })
        })
        .inspect(|item| *counts.entry(item.label.as_str().to_string()).or_default() += 1)
        .collect();

    TrainingBatchResponse {
        success: true,
        total: items.len(),
        counts,
        clips: items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storage::models::SourceType;

    fn clip(label: ActionLabel, status: ClipStatus, skeleton: Option<&str>) -> TrainingClip {
        let mut clip = TrainingClip::new("https://youtu.be/abc", SourceType::Youtube, 10.0, 14.5, label, 0.9);
        clip.status = status;
        clip.skeleton_path = skeleton.map(String::from);
        if status == ClipStatus::Processed {
            clip.processed_at = Some(Utc::now());
        }
        clip
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(parse_status(Some("approved")).unwrap(), Some(ClipStatus::Approved));
        assert!(parse_status(Some("archived")).is_err());
    }

    #[test]
    fn test_parse_approve_body() {
        assert!(parse_approve_body(b"").unwrap().label.is_none());
        assert!(parse_approve_body(b"  \n").unwrap().label.is_none());
        assert!(parse_approve_body(b"{}").unwrap().label.is_none());
        assert_eq!(
            parse_approve_body(br#"{"label":"good"}"#).unwrap().label,
            Some(ActionLabel::Good)
        );

        let err = parse_approve_body(br#"{"label":"great"}"#).unwrap_err();
        assert!(matches!(err, WebError::BadRequest(_)));
        assert!(parse_approve_body(b"not json").is_err());
    }

    #[test]
    fn test_training_batch_filters() {
        let clips = vec![
            clip(ActionLabel::Good, ClipStatus::Processed, Some("a/skeleton.json")),
            clip(ActionLabel::Bad, ClipStatus::Processed, Some("b/skeleton.json")),
            clip(ActionLabel::Bad, ClipStatus::Approved, None),
            clip(ActionLabel::Good, ClipStatus::Processed, None),
        ];

        let all = training_batch(clips.clone(), None);
        assert_eq!(all.total, 2);
        assert_eq!(all.counts["good"], 1);
        assert_eq!(all.counts["bad"], 1);
        assert_eq!(all.counts["normal"], 0);
        assert!((all.clips[0].duration - 4.5).abs() < 1e-9);

        let bad = training_batch(clips, Some(ActionLabel::Bad));
        assert_eq!(bad.total, 1);
        assert_eq!(bad.clips[0].skeleton_path, "b/skeleton.json");
    }

    #[tokio::test]
    async fn test_approve_batch_reports_each_clip() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();

        let pending = clip(ActionLabel::Bad, ClipStatus::Pending, None);
        let rejected = clip(ActionLabel::Bad, ClipStatus::Rejected, None);
        ClipRepository::new(db.pool())
            .insert_many(&[pending.clone(), rejected.clone()])
            .await
            .unwrap();

        let ids = vec![pending.clip_id.clone(), rejected.clip_id.clone(), "missing1".to_string()];
        let summary = approve_batch(&db, &ids, Some(ActionLabel::Normal)).await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 2);
        assert!(summary.details[0].is_success());

        let approved = ClipRepository::new(db.pool()).find(&pending.clip_id).await.unwrap();
        assert_eq!(approved.status, ClipStatus::Approved);
        assert_eq!(approved.label, ActionLabel::Normal);
        assert_eq!(approved.label_confidence, 1.0);
    }
}
