use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ingest::media::CommandMedia;
use ingest::pipeline::{ClipLayout, ClipProcessor, export_clips};
use ingest::pose::CommandPoseEstimator;
use ingest::sources::wtt::{self, WttClient};
use storage::Database;
use storage::models::{MatchRecord, RankingCategory};
use storage::repository::clip::ClipRepository;
use storage::repository::match_record::MatchRecordRepository;
use storage::services::clip_import::{ImportOptions, clips_from_match_analysis};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Table tennis companion data tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/companion.db")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// World Table Tennis ranking cache
    Rankings {
        #[command(subcommand)]
        action: RankingCommand,
    },
    /// Historical match records used for predictions
    Matches {
        #[command(subcommand)]
        action: MatchCommand,
    },
    /// Auto-train clips
    Clips {
        #[command(subcommand)]
        action: ClipCommand,
    },
}

#[derive(Subcommand)]
enum RankingCommand {
    Refresh {
        /// Only this category, e.g. SEN_SINGLES
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum MatchCommand {
    /// Load a JSON array of match records
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum ClipCommand {
    /// Create clips from a saved match analysis
    Import {
        file: PathBuf,

        #[arg(long)]
        auto_approve: bool,

        #[arg(long, default_value_t = 0.7)]
        confidence_threshold: f64,
    },
    ProcessAll {
        #[command(flatten)]
        tools: ToolArgs,
    },
    Export {
        #[arg(long, env = "DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, env = "TRAINING_DIR", default_value = ".")]
        training_dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct ToolArgs {
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, env = "POSE_COMMAND", default_value = "python skeleton.py")]
    pose_command: String,

    #[arg(long, env = "YT_DLP_BIN", default_value = "yt-dlp")]
    yt_dlp: String,

    #[arg(long, env = "FFMPEG_BIN", default_value = "ffmpeg")]
    ffmpeg: String,

    #[arg(long, env = "FFPROBE_BIN", default_value = "ffprobe")]
    ffprobe: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ingest={},storage={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::new(&cli.database_url).await?;
    db.run_migrations().await?;

    match cli.command {
        Commands::Rankings {
            action: RankingCommand::Refresh { category },
        } => handle_rankings_refresh(&db, category).await?,
        Commands::Matches {
            action: MatchCommand::Import { file },
        } => handle_matches_import(&db, file).await?,
        Commands::Clips { action } => match action {
            ClipCommand::Import {
                file,
                auto_approve,
                confidence_threshold,
            } => {
                let options = ImportOptions {
                    auto_approve,
                    confidence_threshold,
                };
                handle_clips_import(&db, file, options).await?
            }
            ClipCommand::ProcessAll { tools } => handle_process_all(&db, tools).await?,
            ClipCommand::Export {
                data_dir,
                training_dir,
            } => handle_export(&db, data_dir, training_dir).await?,
        },
    }

    Ok(())
}

async fn handle_rankings_refresh(db: &Database, category: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let client = WttClient::new()?;

    match category {
        Some(name) => {
            let category =
                RankingCategory::parse(&name).ok_or_else(|| format!("Unknown ranking category '{}'", name))?;
            let count = wtt::refresh_category(&client, db, category).await?;
            tracing::info!("{}: {} players", category.as_str(), count);
        }
        None => {
            let results = wtt::refresh_all(&client, db).await;
            for (category, outcome) in &results {
                tracing::info!("{}: {}", category, outcome);
            }
            if results.values().all(|r| r != "success") {
                return Err("every ranking category failed to refresh".into());
            }
        }
    }

    Ok(())
}

async fn handle_matches_import(db: &Database, file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading match records from: {}", file.display());

    let content = tokio::fs::read_to_string(&file).await?;
    let records: Vec<MatchRecord> = serde_json::from_str(&content)?;

    let written = MatchRecordRepository::new(db.pool()).upsert_many(&records).await?;
    tracing::info!("Imported {} match records", written);

    Ok(())
}

async fn handle_clips_import(
    db: &Database,
    file: PathBuf,
    options: ImportOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(&file).await?;
    let analysis: serde_json::Value = serde_json::from_str(&content)?;

    let clips = clips_from_match_analysis(&analysis, options);
    ClipRepository::new(db.pool()).insert_many(&clips).await?;
    tracing::info!("Imported {} clips from {}", clips.len(), file.display());

    Ok(())
}

async fn handle_process_all(db: &Database, tools: ToolArgs) -> Result<(), Box<dyn std::error::Error>> {
    let media = CommandMedia::new(tools.yt_dlp, tools.ffmpeg, tools.ffprobe);
    let pose = CommandPoseEstimator::new(&tools.pose_command)?;
    let processor = ClipProcessor::new(Arc::new(media), Arc::new(pose), ClipLayout::new(&tools.data_dir));

    let summary = processor.process_all(db).await?;
    for detail in summary.details.iter().filter(|d| !d.is_success()) {
        tracing::warn!(
            "{}: {}",
            detail.clip_id,
            detail.message.as_deref().unwrap_or("failed")
        );
    }
    tracing::info!(
        "Processed {} clips: {} succeeded, {} failed",
        summary.total,
        summary.success,
        summary.failed
    );

    Ok(())
}

async fn handle_export(db: &Database, data_dir: PathBuf, training_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let clips = ClipRepository::new(db.pool()).list(None).await?;
    let counts = export_clips(&clips, &ClipLayout::new(&data_dir), &training_dir).await;

    tracing::info!(
        "Export finished: good={} normal={} bad={} skipped={} errors={}",
        counts.good,
        counts.normal,
        counts.bad,
        counts.skipped,
        counts.errors
    );

    Ok(())
}
