//! Speech-to-text service

use clap::Parser;

use postal_assistant_config::load_settings;
use postal_assistant_server::{build_stt_router, init_tracing, serve};

#[derive(Parser)]
#[command(name = "postal-stt", version, about = "Speech-to-text service")]
struct Cli {
    #[arg(long, env = "POSTAL_ASSISTANT_ENV")]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.env.as_deref())?;
    init_tracing(&settings.observability);

    let stt = &settings.speech.stt;
    tracing::info!(
        engine = %stt.engine_url,
        languages = ?settings.speech.supported_languages,
        "Starting STT service"
    );

    serve(build_stt_router(&settings)?, &stt.host, stt.port).await
}
