//! Text-to-speech service

use clap::Parser;

use postal_assistant_config::load_settings;
use postal_assistant_server::{build_tts_router, init_tracing, serve};

#[derive(Parser)]
#[command(name = "postal-tts", version, about = "Text-to-speech service")]
struct Cli {
    #[arg(long, env = "POSTAL_ASSISTANT_ENV")]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.env.as_deref())?;
    init_tracing(&settings.observability);

    let tts = &settings.speech.tts;
    tracing::info!(
        engine = %tts.engine_url,
        languages = ?settings.speech.supported_languages,
        "Starting TTS service"
    );

    serve(build_tts_router(&settings)?, &tts.host, tts.port).await
}
