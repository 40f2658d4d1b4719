//! Parley - voice-enabled chat client
//!
//! Main entry point for the desktop application.

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use parley::config::ParleyConfig;
use parley::controller::ControllerBuilder;
use parley::ui::{ChatView, ParleyApp};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parley", about = "Voice-enabled chat client")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Answer service endpoint, overriding the configuration file
    #[arg(long, env = "PARLEY_ENDPOINT")]
    endpoint: Option<String>,

    /// Start with sound disabled
    #[arg(long)]
    mute: bool,

    /// Disable voice capture
    #[arg(long)]
    no_voice_input: bool,
}

fn load_config(args: &Args) -> Result<ParleyConfig> {
    let mut config = match &args.config {
        Some(path) => ParleyConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ParleyConfig::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if args.mute {
        config = config.muted();
    }
    if args.no_voice_input {
        config = config.without_voice_input();
    }

    Ok(config)
}

/// Attach microphone and speaker engines when the speech service is reachable
#[cfg(feature = "audio-io")]
fn with_device_engines(builder: ControllerBuilder, config: &ParleyConfig) -> ControllerBuilder {
    use parley::speech::{MicrophoneRecognizer, SpeakerSynthesizer, SpeechService};
    use std::sync::Arc;

    let Some(api_key) = config.speech.api_key() else {
        tracing::warn!(
            "{} is not set, voice input and output are disabled",
            config.speech.api_key_env
        );
        return builder;
    };

    let service = Arc::new(SpeechService::new(&config.speech, Some(api_key)));
    info!("Speech service at {}", config.speech.base_url);
    builder
        .with_recognizer(Box::new(MicrophoneRecognizer::new(Arc::clone(&service))))
        .with_synthesizer(Box::new(SpeakerSynthesizer::new(
            service,
            &config.speech.voices,
            &config.voice.language,
        )))
}

#[cfg(not(feature = "audio-io"))]
fn with_device_engines(builder: ControllerBuilder, _config: &ParleyConfig) -> ControllerBuilder {
    info!("Built without audio-io, voice input and output are disabled");
    builder
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    info!("Starting Parley (endpoint: {})", config.endpoint);

    let view = ChatView::new();
    let builder = with_device_engines(ControllerBuilder::new(), &config);
    let (controller, handle) = match builder
        .with_config(config)
        .with_renderer(Box::new(view.clone()))
        .build()
    {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to start turn controller: {}", e);
            anyhow::bail!(e.user_message());
        }
    };
    let worker = controller.spawn()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title("Parley"),
        ..Default::default()
    };

    eframe::run_native(
        "Parley",
        options,
        Box::new(|cc| Ok(Box::new(ParleyApp::new(cc, view, handle)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;

    if worker.join().is_err() {
        error!("Turn controller thread panicked");
    }

    Ok(())
}
