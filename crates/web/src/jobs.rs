//! Background training jobs. Each job runs in its own task and publishes its
//! progress on a watch channel; status requests read the latest value.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ingest::Trainer;
use ingest::trainer::TrainerEvent;
use storage::dto::training::{TrainRequest, TrainingProgress, TrainingStatus};
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Finished jobs kept for status polling
const MAX_FINISHED_JOBS: usize = 100;
const FINISHED_JOB_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Job {
    progress: Arc<watch::Sender<TrainingProgress>>,
    abort: AbortHandle,
    started_at: Instant,
}

impl Job {
    fn is_finished(&self) -> bool {
        self.progress.borrow().status.is_finished()
    }
}

/// Applies `update` unless the job already reached a final state.
fn update(progress: &watch::Sender<TrainingProgress>, update: impl FnOnce(&mut TrainingProgress)) {
    progress.send_if_modified(|p| {
        if p.status.is_finished() {
            return false;
        }
        update(p);
        true
    });
}

#[derive(Clone)]
pub struct TrainingJobs {
    trainer: Arc<dyn Trainer>,
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    max_finished: usize,
    finished_ttl: Duration,
}

impl TrainingJobs {
    pub fn new(trainer: Arc<dyn Trainer>) -> Self {
        Self {
            trainer,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            max_finished: MAX_FINISHED_JOBS,
            finished_ttl: FINISHED_JOB_TTL,
        }
    }

    pub fn with_retention(mut self, max_finished: usize, finished_ttl: Duration) -> Self {
        self.max_finished = max_finished;
        self.finished_ttl = finished_ttl;
        self
    }

    /// Drops finished jobs older than the ttl, then the oldest finished ones
    /// beyond the cap. Running jobs are never dropped.
    fn prune(&self, jobs: &mut HashMap<Uuid, Job>) {
        let ttl = self.finished_ttl;
        jobs.retain(|_, job| !(job.is_finished() && job.started_at.elapsed() >= ttl));

        let mut finished: Vec<(Instant, Uuid)> = jobs
            .iter()
            .filter(|(_, job)| job.is_finished())
            .map(|(id, job)| (job.started_at, *id))
            .collect();

        if finished.len() > self.max_finished {
            finished.sort();
            let excess = finished.len() - self.max_finished;
            for (_, id) in finished.into_iter().take(excess) {
                jobs.remove(&id);
            }
        }
    }

    /// Starts a job and returns its id immediately.
    pub async fn start(&self, config: TrainRequest) -> Uuid {
        let task_id = Uuid::new_v4();
        let (tx, _rx) = watch::channel(TrainingProgress::new(task_id, config.epochs));
        let progress = Arc::new(tx);

        let trainer = self.trainer.clone();
        let job_progress = progress.clone();

        let handle = tokio::spawn(async move {
            update(&job_progress, |p| {
                p.status = TrainingStatus::Training;
                p.message = format!("Training {} model", config.model_type);
            });

            let (events_tx, mut events_rx) = mpsc::unbounded_channel::<TrainerEvent>();
            let run = trainer.run(&config, events_tx);
            let drain = async {
                while let Some(event) = events_rx.recv().await {
                    update(&job_progress, |p| event.apply(p));
                }
            };

            let (result, ()) = tokio::join!(run, drain);

            match result {
                Ok(()) => {
                    tracing::info!("Training job {} completed", task_id);
                    update(&job_progress, |p| {
                        p.status = TrainingStatus::Completed;
                        p.message = "Training completed".to_string();
                    });
                }
                Err(e) => {
                    tracing::warn!("Training job {} failed: {}", task_id, e);
                    update(&job_progress, |p| {
                        p.status = TrainingStatus::Failed;
                        p.message = e.to_string();
                        p.push_log(format!("error: {}", e));
                    });
                }
            }
        });

        let mut jobs = self.jobs.write().await;
        self.prune(&mut jobs);
        jobs.insert(
            task_id,
            Job {
                progress,
                abort: handle.abort_handle(),
                started_at: Instant::now(),
            },
        );
        drop(jobs);

        tracing::info!("Started training job {}", task_id);
        task_id
    }

    /// Status view of a job, `None` for unknown ids.
    pub async fn status(&self, task_id: Uuid) -> Option<TrainingProgress> {
        let jobs = self.jobs.read().await;
        jobs.get(&task_id).map(|job| job.progress.borrow().snapshot())
    }

    /// Marks a running job cancelled and stops its task. Returns the final
    /// state, or `None` for unknown ids. Finished jobs are left as they are.
    pub async fn cancel(&self, task_id: Uuid) -> Option<TrainingProgress> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&task_id)?;

        update(&job.progress, |p| {
            p.status = TrainingStatus::Cancelled;
            p.message = "Training cancelled".to_string();
        });
        job.abort.abort();

        let snapshot = job.progress.borrow().snapshot();
        Some(snapshot)
    }
}
