use pokedex_explorer::{AppContext, AppError, Config, HttpSource, LogFormat, LoadOutcome, server};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // axum logs rejections from built-in extractors with the `axum::rejection`
        // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
        format!(
            "{}=debug,tower_http=debug,axum::rejection=trace",
            env!("CARGO_CRATE_NAME")
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let source = HttpSource::new(&config.pokemon, &config.cache)
        .map_err(|e| AppError::ConfigError(format!("cannot build HTTP client: {e}")))?;
    let source = Arc::new(source);

    if config.pokemon.cache_enabled {
        let sweeper = Arc::clone(&source);
        let every = Duration::from_secs(config.cache.sweep_interval.max(1));
        tokio::spawn(async move { sweeper.sweep_caches(every).await });
    }

    let app = Arc::new(AppContext::new(&config, source));

    // First page loads in the background so the surface is reachable at once.
    let warmup = Arc::clone(&app);
    tokio::spawn(async move {
        if warmup.collection().reload().await == LoadOutcome::Failed {
            tracing::warn!("Initial page load failed; POST /collection/reload to retry");
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to bind to address {}: {}", config.server.bind_address, e)
        })?;

    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, server::router(app)).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = Config::load();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.logging.format)
            .unwrap_or_default(),
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
