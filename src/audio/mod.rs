//! JACK client hosting the loop engine.

use color_eyre::{Result, eyre::bail};
use jack::PortFlags;
use tokio::sync::mpsc;

use crate::config::SAMPLE_RATE;
use crate::engine::SharedEngine;

mod callback;
mod notifications;

pub use callback::run_block;
pub use notifications::AudioEvent;

const PORT_TYPE: &str = "32 bit float mono audio";

#[derive(Debug)]
pub struct AudioState {
    pub sample_rate: usize,
    pub events: mpsc::UnboundedReceiver<AudioEvent>, // Audio -> Main
}

pub fn audio_setup(
    client_name: &str,
    engine: SharedEngine,
) -> Result<(
    jack::AsyncClient<impl jack::NotificationHandler, impl jack::ProcessHandler>,
    AudioState,
)> {
    jack::set_logger(jack::LoggerType::None);

    let (client, status) = jack::Client::new(client_name, jack::ClientOptions::default())?;
    log::info!(
        "jack client {:?} opened, status {status:?}, buffer {} frames",
        client.name(),
        client.buffer_size()
    );

    let sample_rate = client.sample_rate() as usize;
    check_sample_rate(sample_rate)?;

    let in_port = client.register_port("in", jack::AudioIn::default())?;
    let out_port = client.register_port("out", jack::AudioOut::default())?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let notification_handler = notifications::Notifications::new(event_tx);
    let callback_handler = callback::create_callback(callback::AudioCallbackSettings {
        in_port,
        out_port,
        engine,
    });

    let active_client = client.activate_async(notification_handler, callback_handler)?;

    {
        let client = active_client.as_client();
        let own_in = format!("{}:in", client.name());
        let own_out = format!("{}:out", client.name());

        let src_ports = client.ports(
            None,
            Some(PORT_TYPE),
            PortFlags::IS_OUTPUT.union(PortFlags::IS_PHYSICAL),
        );
        match src_ports.first() {
            Some(port) => {
                if let Err(e) = client.connect_ports_by_name(port.as_str(), &own_in) {
                    log::warn!("could not connect {port} to {own_in}: {e}");
                }
            }
            None => log::warn!("no physical capture port to connect"),
        }

        let dest_ports = client.ports(
            None,
            Some(PORT_TYPE),
            PortFlags::IS_INPUT.union(PortFlags::IS_PHYSICAL),
        );
        for port in &dest_ports {
            if let Err(e) = client.connect_ports_by_name(&own_out, port.as_str()) {
                log::warn!("could not connect {own_out} to {port}: {e}");
            }
        }
    }

    let state = AudioState {
        sample_rate,
        events: event_rx,
    };
    Ok((active_client, state))
}

/// Loops and their files are 48 kHz; any other server rate would save
/// takes with a header that lies about their speed.
fn check_sample_rate(rate: usize) -> Result<()> {
    if rate != SAMPLE_RATE as usize {
        bail!("jack runs at {rate} Hz, the looper needs {SAMPLE_RATE} Hz");
    }
    Ok(())
}
