use std::fs::File;
use std::path::PathBuf;

use color_eyre::{Result, eyre::WrapErr};
use crossterm::event::EventStream;
use ratatui::DefaultTerminal;
use tokio::sync::{mpsc, oneshot};

use sdlooper::app::App;
use sdlooper::audio;
use sdlooper::config::{LooperConfig, MAX_SAMPLES, load_config};
use sdlooper::controls::Controls;
use sdlooper::display::{Screen, TerminalDisplay};
use sdlooper::engine::{self, LoopEngine};
use sdlooper::feedback::{Indicator, LogIndicator, hold, ms};
use sdlooper::gpio::{self, GpioLeds};
use sdlooper::menu::MenuStateMachine;
use sdlooper::session::Session;
use sdlooper::storage::DirStorage;

const DEFAULT_CONFIG: &str = "sdlooper.yaml";
const DEFAULT_LOG: &str = "sdlooper.log";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging()?;

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = load_config(&config_path);

    let terminal = ratatui::init();
    let result = run(config, terminal).await;
    ratatui::restore();
    if let Err(e) = &result {
        log::error!("{e:?}");
    }
    result
}

/// The terminal belongs to the UI, so log lines go to a file.
fn init_logging() -> Result<()> {
    let path = std::env::var("SDLOOPER_LOG").unwrap_or_else(|_| DEFAULT_LOG.to_string());
    let file = File::create(&path).wrap_err_with(|| format!("failed to create log file {path}"))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

async fn run(config: LooperConfig, terminal: DefaultTerminal) -> Result<()> {
    let mut screen = Screen::new(Box::new(TerminalDisplay::new(terminal)), config.message_scale);

    let storage = match DirStorage::mount(&config.storage_root) {
        Ok(storage) => storage,
        Err(e) => {
            screen.show_message("Mount failed", ms(hold::LONG));
            return Err(e).wrap_err_with(|| format!("failed to mount {:?}", config.storage_root));
        }
    };

    let engine = engine::shared(LoopEngine::new(MAX_SAMPLES));
    let audio = audio::audio_setup(&config.client_name, engine.clone());
    let (active_client, audio_state) = match audio {
        Ok(audio) => audio,
        Err(e) => {
            screen.show_message("Audio init failed", ms(hold::LONG));
            return Err(e.wrap_err("failed to start the jack client"));
        }
    };
    log::info!("audio running at {} Hz", audio_state.sample_rate);

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (leds, poller) = match &config.gpio {
        Some(pins) => {
            let leds = GpioLeds::new(pins).wrap_err("failed to claim the LED pins")?;
            let poller = gpio::spawn_poller(pins, control_tx.clone(), shutdown_rx)
                .wrap_err("failed to claim the control pins")?;
            (Box::new(leds) as Box<dyn Indicator>, Some(poller))
        }
        None => {
            log::info!("no gpio configured, keyboard only");
            (Box::new(LogIndicator) as Box<dyn Indicator>, None)
        }
    };

    let mut app = App {
        session: Session::new(
            engine,
            Box::new(storage),
            screen,
            leds,
            config.message_scale,
        ),
        menu: MenuStateMachine::new(),
        controls: Controls::new(ms(config.reset_hold_ms)),
        control_rx,
        audio_events: audio_state.events,
        event_stream: EventStream::new(),
    };
    let result = app.run().await;

    let _ = shutdown_tx.send(());
    if let Some(poller) = poller {
        if poller.join().is_err() {
            log::warn!("gpio poller panicked");
        }
    }
    drop(control_tx);
    if let Err(e) = active_client.deactivate() {
        log::warn!("jack deactivate failed: {e}");
    }
    result
}
