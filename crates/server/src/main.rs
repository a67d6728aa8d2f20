//! Postal Assistant chat server

use clap::Parser;

use postal_assistant_config::load_settings;
use postal_assistant_server::{build_state, create_router, init_metrics, init_tracing, serve};

#[derive(Parser)]
#[command(name = "postal-assistant", version, about = "Postal assistant chat API server")]
struct Cli {
    /// Re-embed every knowledge collection before serving
    #[arg(long)]
    ingest: bool,

    /// Configuration environment (loads config/{env}.yaml)
    #[arg(long, env = "POSTAL_ASSISTANT_ENV")]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let settings = load_settings(cli.env.as_deref())?;
    init_tracing(&settings.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        config_env = cli.env.as_deref().unwrap_or("default"),
        "Starting postal assistant"
    );

    let metrics = if settings.observability.metrics_enabled {
        init_metrics()
    } else {
        None
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let state = build_state(settings, cli.ingest).await?.with_metrics(metrics);

    let cleanup = state.sessions.start_cleanup_task(state.chat.clone());
    let result = serve(create_router(state), &host, port).await;

    let _ = cleanup.send(true);
    result
}
