use lyric_studio::config::{self, StudioConfig};
use lyric_studio::generation::{GenerationClient, HttpGenerationClient, OfflineGenerationClient};
use lyric_studio::messaging::{Notifier, create_notification_channel};
use lyric_studio::ui::StudioApp;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 256;

// Generation can take a while on a cold backend
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Command line: `lyric_studio [--config <file.ron>] [--response <file.json>]`
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    response: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "--config" => &mut args.config,
            "--response" => &mut args.response,
            other => return Err(format!("unknown argument: {}", other)),
        };
        let value = iter
            .next()
            .ok_or_else(|| format!("{} needs a path", flag))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(args)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("usage: lyric_studio [--config <file.ron>] [--response <file.json>]");
            std::process::exit(2);
        }
    };

    let studio_config = match &args.config {
        Some(path) => match StudioConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        },
        None => StudioConfig::load_or_default(),
    };
    if !config::install(studio_config) {
        log::warn!("Configuration was already installed");
    }
    let studio_config = config::global();

    let client: Arc<dyn GenerationClient> = match &args.response {
        Some(path) => {
            log::info!("Offline mode, replaying {}", path.display());
            Arc::new(OfflineGenerationClient::new(path))
        }
        None => {
            let client = HttpGenerationClient::new(&studio_config.backend_url, GENERATION_TIMEOUT);
            log::info!("Generation backend at {}", client.url());
            Arc::new(client)
        }
    };

    let (notification_tx, notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notifier = Notifier::new(notification_tx);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 680.0])
            .with_title("Lyric Studio"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "Lyric Studio",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(StudioApp::new(
                studio_config.clone(),
                client,
                notifier,
                notification_rx,
            )))
        }),
    ) {
        log::error!("UI exited with error: {}", e);
    }
}
