use anyhow::Context;
use storage::Database;
use web::config::Config;
use web::scheduler;
use web::state::{AppState, Collaborators, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting table tennis companion API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded ({} environment)", config.environment);

    tracing::info!("Connecting to database at: {}", config.database_url);
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    for dir in [config.data_dir.clone(), config.upload_dir()] {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let collaborators = Collaborators::from_config(&config).context("Failed to build external clients")?;
    let state = AppState::new(db.clone(), collaborators, Settings::from_config(&config));

    if config.scheduler_enabled {
        tracing::info!(
            "Ranking refresh every {} hour(s)",
            config.update_interval.as_secs() / 3600
        );
        scheduler::spawn_ranking_refresher(state.rankings.clone(), db, config.update_interval);
    } else {
        tracing::info!("Ranking scheduler disabled, refreshing once at startup");
        scheduler::spawn_initial_refresh(state.rankings.clone(), db);
    }

    if config.allows_any_origin() {
        tracing::warn!("CORS allows any origin");
    }

    let app = web::build_app(state, &config.allowed_origins);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
