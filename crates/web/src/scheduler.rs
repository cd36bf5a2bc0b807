use std::sync::Arc;
use std::time::Duration;

use ingest::RankingSource;
use ingest::sources::wtt;
use storage::Database;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Refreshes every ranking category now and then every `period`.
pub fn spawn_ranking_refresher(source: Arc<dyn RankingSource>, db: Database, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let results = wtt::refresh_all(source.as_ref(), &db).await;
            let ok = results.values().filter(|r| *r == "success").count();
            tracing::info!("Scheduled ranking refresh: {}/{} categories updated", ok, results.len());
        }
    })
}

/// One refresh at startup when the schedule is off.
pub fn spawn_initial_refresh(source: Arc<dyn RankingSource>, db: Database) -> JoinHandle<()> {
    tokio::spawn(async move {
        let results = wtt::refresh_all(source.as_ref(), &db).await;
        tracing::info!("Initial ranking refresh: {:?}", results);
    })
}
