use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{Event, EventStream};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

use crate::audio::AudioEvent;
use crate::controls::{ControlEvent, Controls};
use crate::feedback::{hold, ms};
use crate::keyboard::map_key;
use crate::menu::{MenuHost, MenuStateMachine};
use crate::session::Session;

/// Upper bound between two control polls, so hold timers keep running
/// while no input arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct App {
    /// Storage, codec, screen and lamps.
    pub session: Session,
    pub menu: MenuStateMachine,
    pub controls: Controls,
    /// Control events from the GPIO poller.
    pub control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    /// Server notifications from the audio side.
    pub audio_events: mpsc::UnboundedReceiver<AudioEvent>,
    /// The event stream for receiving terminal events.
    pub event_stream: EventStream,
}

impl App {
    pub async fn run(&mut self) -> Result<()> {
        self.menu.render(&mut self.session);
        while !self.exiting() {
            self.handle_events().await?;
            // Saves and loads block for seconds; keep the runtime's other
            // tasks moving meanwhile.
            tokio::task::block_in_place(|| self.poll(Instant::now()));
        }
        log::info!("exit requested");
        Ok(())
    }

    pub fn exiting(&self) -> bool {
        self.controls.quit_requested()
    }

    async fn handle_events(&mut self) -> Result<()> {
        let event = self.event_stream.next().fuse();
        let sleep = tokio::time::sleep(POLL_INTERVAL);
        tokio::select! {
            maybe_event = event => {
                if let Some(event) = maybe_event {
                    if let Event::Key(key_event) = event? {
                        for control in map_key(&key_event) {
                            self.controls.apply(*control, Instant::now());
                        }
                    }
                }
            },
            Some(control) = self.control_rx.recv() => {
                self.controls.apply(control, Instant::now());
            },
            Some(event) = self.audio_events.recv() => self.handle_audio_event(event),
            _ = sleep => {}
        }
        Ok(())
    }

    fn handle_audio_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::RateMismatch { rate } => {
                log::error!("jack switched to {rate} Hz, stopping");
                self.session.message("Audio stopped", ms(hold::LONG));
                self.controls.apply(ControlEvent::Quit, Instant::now());
            }
            AudioEvent::Xrun { count } => log::warn!("xrun #{count}"),
            AudioEvent::Freewheel(on) => {
                log::info!("jack freewheel {}", if on { "on" } else { "off" });
            }
        }
    }

    /// Transport first, then the menu.
    fn poll(&mut self, now: Instant) {
        self.session.apply_controls(&mut self.controls, now);
        let (delta, pressed) = self.controls.take_menu();
        if delta != 0 || pressed {
            self.menu.handle(delta, pressed, &mut self.session);
        }
    }
}
