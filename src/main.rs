use anyhow::Context;
use aura_terminal::commentary::{
    CommentaryProvider, HttpCommentaryProvider, MockCommentaryProvider, NewsProvider,
};
use aura_terminal::{
    api, config::Config, db::init_db, PreferencesStore, Simulator, TerminalController,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database_path)
        .await
        .context("failed to initialize preferences database")?;
    let prefs = Arc::new(PreferencesStore::new(pool));

    if prefs.account().await?.needs_setup() {
        tracing::info!("No trader profile yet; onboarding required");
    }

    let (commentary, news): (Arc<dyn CommentaryProvider>, Arc<dyn NewsProvider>) =
        match &config.commentary_api_url {
            Some(url) => {
                let provider = Arc::new(HttpCommentaryProvider::new(url.clone()));
                (
                    provider.clone() as Arc<dyn CommentaryProvider>,
                    provider as Arc<dyn NewsProvider>,
                )
            }
            None => {
                tracing::info!("COMMENTARY_API_URL not set, using offline commentary");
                let provider = Arc::new(MockCommentaryProvider::new());
                (
                    provider.clone() as Arc<dyn CommentaryProvider>,
                    provider as Arc<dyn NewsProvider>,
                )
            }
        };

    let sim = Simulator::from_config(&config);
    let (terminal, task) = TerminalController::spawn(sim, config.tick_interval);

    let app = api::create_router(api::AppState::new(terminal, prefs, commentary, news));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    let sim = task
        .shutdown()
        .await
        .context("terminal task panicked")?;
    tracing::info!(
        "Terminal stopped after {} ticks, net liquidity {}",
        sim.ticks(),
        sim.net_liquidity()
    );
    Ok(())
}
