//! Poll-side context: everything the menu and the controls act on.

use std::time::{Duration, Instant};

use crate::catalog::FileCatalog;
use crate::codec::PersistenceCodec;
use crate::controls::{Controls, Outcome};
use crate::display::Screen;
use crate::engine::{self, SharedEngine, TransportStatus};
use crate::feedback::{Feedback, Indicator};
use crate::menu::{MenuHost, MenuView};
use crate::storage::Storage;

/// Times the lamps alternate when the loop is erased.
const FLASHES: usize = 3;
const FLASH_STEP: Duration = Duration::from_millis(200);

/// Screen and lamps, the operator-facing half of the session.
struct Panel {
    screen: Screen,
    leds: Box<dyn Indicator>,
    flash_step: Duration,
}

impl Feedback for Panel {
    fn message(&mut self, text: &str, hold: Duration) {
        self.screen.show_message(text, hold);
    }

    fn transport(&mut self, status: &TransportStatus) {
        self.leds.set(status.playing, status.recording);
    }

    fn reset_flash(&mut self) {
        for _ in 0..FLASHES {
            self.leds.set(true, false);
            pause(self.flash_step);
            self.leds.set(false, true);
            pause(self.flash_step);
        }
        self.leds.set(false, false);
    }
}

fn pause(step: Duration) {
    if !step.is_zero() {
        std::thread::sleep(step);
    }
}

pub struct Session {
    engine: SharedEngine,
    storage: Box<dyn Storage>,
    codec: PersistenceCodec,
    panel: Panel,
}

impl Session {
    /// `message_scale` also stretches the reset flash; 0 makes it instant.
    pub fn new(
        engine: SharedEngine,
        storage: Box<dyn Storage>,
        screen: Screen,
        leds: Box<dyn Indicator>,
        message_scale: f32,
    ) -> Self {
        Session {
            engine,
            storage,
            codec: PersistenceCodec::new(),
            panel: Panel {
                screen,
                leds,
                flash_step: FLASH_STEP.mul_f32(message_scale.max(0.0)),
            },
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn codec(&self) -> &PersistenceCodec {
        &self.codec
    }

    /// Run pending control gestures against the engine and mirror the
    /// result on the lamps and the status line. Idle polls do not touch the
    /// engine lock, so they never cost the audio callback a block.
    pub fn apply_controls(&mut self, controls: &mut Controls, now: Instant) -> Outcome {
        if !controls.pending(now) {
            return Outcome::default();
        }
        let (outcome, status) = {
            let mut engine = engine::lock(&self.engine);
            let outcome = controls.update(&mut engine, now);
            (outcome, engine.status())
        };

        if outcome.erased {
            log::info!("loop erased");
            self.panel.reset_flash();
        }
        if outcome.transport_changed {
            log::info!(
                "transport: {:?} playing={} recording={} length={}",
                status.mode,
                status.playing,
                status.recording,
                status.length
            );
            self.panel.transport(&status);
            self.panel.screen.draw_status(&status);
        }
        outcome
    }
}

impl MenuHost for Session {
    fn save(&mut self) {
        // Holding the lock keeps the audio callback off the buffer.
        let engine = engine::lock(&self.engine);
        let wav = self
            .codec
            .export_wav(&engine, self.storage.as_ref(), &mut self.panel);
        let raw = self
            .codec
            .export_raw(&engine, self.storage.as_ref(), &mut self.panel);
        if let (Ok(wav), Ok(raw)) = (&wav, &raw) {
            log::debug!("save wrote {wav} and {raw}");
        }
    }

    fn rescan(&mut self, catalog: &mut FileCatalog, suffix: &str) {
        catalog.rescan(self.storage.as_ref(), suffix);
        log::debug!("catalog: {:?}", catalog.names());
    }

    fn load(&mut self, name: &str) {
        let mut engine = engine::lock(&self.engine);
        if let Ok(report) =
            self.codec
                .import_raw(name, &mut engine, self.storage.as_ref(), &mut self.panel)
        {
            log::debug!("import of {name}: {report:?}");
        }
    }

    fn message(&mut self, text: &str, hold: Duration) {
        self.panel.message(text, hold);
    }

    fn render(&mut self, view: &MenuView<'_>) {
        let status = engine::lock(&self.engine).status();
        self.panel.screen.draw_menu(view, &status);
    }
}
