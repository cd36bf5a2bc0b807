use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{Result, StorageError};
use crate::models::{ActionLabel, ClipStatus, TrainingClip};

const CLIP_COLUMNS: &str = r#"
    clip_id, source_video, source_type, start_time, end_time, label,
    label_confidence, description, error_type, status, created_at,
    processed_at, skeleton_path
"#;

pub struct ClipRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClipRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a batch of clips in one transaction
    pub async fn insert_many(&self, clips: &[TrainingClip]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for clip in clips {
            sqlx::query(
                r#"
                INSERT INTO training_clips (
                    clip_id, source_video, source_type, start_time, end_time, label,
                    label_confidence, description, error_type, status, created_at,
                    processed_at, skeleton_path
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&clip.clip_id)
            .bind(&clip.source_video)
            .bind(clip.source_type)
            .bind(clip.start_time)
            .bind(clip.end_time)
            .bind(clip.label)
            .bind(clip.label_confidence)
            .bind(&clip.description)
            .bind(&clip.error_type)
            .bind(clip.status)
            .bind(clip.created_at)
            .bind(clip.processed_at)
            .bind(&clip.skeleton_path)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    StorageError::ConstraintViolation(format!(
                        "clip '{}' already exists",
                        clip.clip_id
                    ))
                } else {
                    err
                }
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List clips, newest first, optionally filtered by status
    pub async fn list(&self, status: Option<ClipStatus>) -> Result<Vec<TrainingClip>> {
        let clips = match status {
            Some(status) => {
                sqlx::query_as::<_, TrainingClip>(&format!(
                    "SELECT {} FROM training_clips WHERE status = ? ORDER BY created_at DESC, rowid DESC",
                    CLIP_COLUMNS
                ))
                .bind(status)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TrainingClip>(&format!(
                    "SELECT {} FROM training_clips ORDER BY created_at DESC, rowid DESC",
                    CLIP_COLUMNS
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(clips)
    }

    pub async fn find(&self, clip_id: &str) -> Result<TrainingClip> {
        sqlx::query_as::<_, TrainingClip>(&format!(
            "SELECT {} FROM training_clips WHERE clip_id = ?",
            CLIP_COLUMNS
        ))
        .bind(clip_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Approve a pending clip, optionally relabelling it with full confidence.
    /// Approving an already approved clip only applies the relabel.
    pub async fn approve(&self, clip_id: &str, label: Option<ActionLabel>) -> Result<TrainingClip> {
        let clip = self.transition(clip_id, ClipStatus::Approved).await?;

        match label {
            Some(label) => self.update_label(clip_id, label).await,
            None => Ok(clip),
        }
    }

    pub async fn reject(&self, clip_id: &str) -> Result<TrainingClip> {
        self.transition(clip_id, ClipStatus::Rejected).await
    }

    /// Manual relabel. Allowed in every status and sets confidence to 1.0.
    pub async fn update_label(&self, clip_id: &str, label: ActionLabel) -> Result<TrainingClip> {
        let result = sqlx::query(
            "UPDATE training_clips SET label = ?, label_confidence = 1.0 WHERE clip_id = ?",
        )
        .bind(label)
        .bind(clip_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.find(clip_id).await
    }

    /// Record pose extraction output and move the clip to `processed`.
    pub async fn mark_processed(
        &self,
        clip_id: &str,
        skeleton_path: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<TrainingClip> {
        let current = self.find(clip_id).await?;
        ensure_transition(current.status, ClipStatus::Processed)?;

        let result = sqlx::query(
            r#"
            UPDATE training_clips
            SET status = ?, skeleton_path = ?, processed_at = ?
            WHERE clip_id = ? AND status IN (?, ?)
            "#,
        )
        .bind(ClipStatus::Processed)
        .bind(skeleton_path)
        .bind(processed_at)
        .bind(clip_id)
        .bind(ClipStatus::Approved)
        .bind(ClipStatus::Processed)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.lost_race(clip_id, ClipStatus::Processed).await;
        }

        self.find(clip_id).await
    }

    pub async fn delete(&self, clip_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM training_clips WHERE clip_id = ?")
            .bind(clip_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    /// Remove every clip, returning how many were deleted
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM training_clips")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Status-only move. The UPDATE is guarded on the status read just before,
    /// so a concurrent writer can never be overwritten with an older state.
    async fn transition(&self, clip_id: &str, next: ClipStatus) -> Result<TrainingClip> {
        let current = self.find(clip_id).await?;
        ensure_transition(current.status, next)?;

        if current.status == next {
            return Ok(current);
        }

        let result = sqlx::query("UPDATE training_clips SET status = ? WHERE clip_id = ? AND status = ?")
            .bind(next)
            .bind(clip_id)
            .bind(current.status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return self.lost_race(clip_id, next).await;
        }

        Ok(TrainingClip {
            status: next,
            ..current
        })
    }

    async fn lost_race(&self, clip_id: &str, next: ClipStatus) -> Result<TrainingClip> {
        let now = self.find(clip_id).await?;
        if now.status == next {
            return Ok(now);
        }
        Err(StorageError::InvalidTransition {
            from: now.status,
            to: next,
        })
    }
}

fn ensure_transition(from: ClipStatus, to: ClipStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StorageError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::test_db;

    fn clip(label: ActionLabel) -> TrainingClip {
        TrainingClip::new(
            "https://www.youtube.com/watch?v=abc123",
            SourceType::Youtube,
            10.0,
            15.0,
            label,
            0.8,
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let c = clip(ActionLabel::Bad);
        repo.insert_many(std::slice::from_ref(&c)).await.unwrap();

        let found = repo.find(&c.clip_id).await.unwrap();
        assert_eq!(found.label, ActionLabel::Bad);
        assert_eq!(found.status, ClipStatus::Pending);
        assert_eq!(found.source_type, SourceType::Youtube);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        assert!(matches!(repo.find("nope").await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_approve_with_relabel_sets_full_confidence() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let c = clip(ActionLabel::Bad);
        repo.insert_many(std::slice::from_ref(&c)).await.unwrap();

        let approved = repo.approve(&c.clip_id, Some(ActionLabel::Good)).await.unwrap();
        assert_eq!(approved.status, ClipStatus::Approved);
        assert_eq!(approved.label, ActionLabel::Good);
        assert_eq!(approved.label_confidence, 1.0);
    }

    #[tokio::test]
    async fn test_status_never_moves_backwards() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let c = clip(ActionLabel::Bad);
        repo.insert_many(std::slice::from_ref(&c)).await.unwrap();

        repo.reject(&c.clip_id).await.unwrap();
        let err = repo.approve(&c.clip_id, None).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidTransition {
                from: ClipStatus::Rejected,
                to: ClipStatus::Approved
            }
        ));
        assert_eq!(repo.find(&c.clip_id).await.unwrap().status, ClipStatus::Rejected);
    }

    #[tokio::test]
    async fn test_processing_requires_approval() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let c = clip(ActionLabel::Good);
        repo.insert_many(std::slice::from_ref(&c)).await.unwrap();

        let err = repo
            .mark_processed(&c.clip_id, "skeletons/x/skeleton.json", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));

        repo.approve(&c.clip_id, None).await.unwrap();
        let processed = repo
            .mark_processed(&c.clip_id, "skeletons/x/skeleton.json", Utc::now())
            .await
            .unwrap();
        assert_eq!(processed.status, ClipStatus::Processed);
        assert!(processed.processed_at.is_some());

        assert!(repo.approve(&c.clip_id, None).await.is_err());
        assert!(repo.reject(&c.clip_id).await.is_err());
    }

    #[tokio::test]
    async fn test_repeated_approve_is_noop() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let c = clip(ActionLabel::Good);
        repo.insert_many(std::slice::from_ref(&c)).await.unwrap();

        repo.approve(&c.clip_id, None).await.unwrap();
        let again = repo.approve(&c.clip_id, None).await.unwrap();
        assert_eq!(again.status, ClipStatus::Approved);
    }

    #[tokio::test]
    async fn test_delete_removes_from_list() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let a = clip(ActionLabel::Good);
        let b = clip(ActionLabel::Bad);
        repo.insert_many(&[a.clone(), b.clone()]).await.unwrap();

        repo.delete(&a.clip_id).await.unwrap();
        let remaining = repo.list(None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].clip_id, b.clip_id);

        assert!(matches!(repo.delete(&a.clip_id).await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_by_status_and_clear() {
        let db = test_db().await;
        let repo = ClipRepository::new(db.pool());
        let a = clip(ActionLabel::Good);
        let b = clip(ActionLabel::Bad);
        repo.insert_many(&[a.clone(), b.clone()]).await.unwrap();
        repo.approve(&a.clip_id, None).await.unwrap();

        let approved = repo.list(Some(ClipStatus::Approved)).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].clip_id, a.clip_id);

        assert_eq!(repo.clear().await.unwrap(), 2);
        assert!(repo.list(None).await.unwrap().is_empty());
    }
}
