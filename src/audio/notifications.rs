use tokio::sync::mpsc;

use crate::config::SAMPLE_RATE;

/// Server events the looper reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    /// The server moved away from the rate loops are stored at. The client
    /// has asked to be shut down.
    RateMismatch { rate: jack::Frames },
    /// Dropout number `count` since start-up.
    Xrun { count: u64 },
    /// Freewheel mode runs the graph faster than real time.
    Freewheel(bool),
}

pub struct Notifications {
    tx: mpsc::UnboundedSender<AudioEvent>,
    xruns: u64,
}

impl Notifications {
    pub fn new(tx: mpsc::UnboundedSender<AudioEvent>) -> Self {
        Notifications { tx, xruns: 0 }
    }

    fn send(&self, event: AudioEvent) {
        let _ = self.tx.send(event);
    }

    fn rate_changed(&mut self, rate: jack::Frames) -> jack::Control {
        if rate == SAMPLE_RATE {
            return jack::Control::Continue;
        }
        self.send(AudioEvent::RateMismatch { rate });
        jack::Control::Quit
    }

    fn dropout(&mut self) -> jack::Control {
        self.xruns += 1;
        self.send(AudioEvent::Xrun { count: self.xruns });
        jack::Control::Continue
    }
}

impl jack::NotificationHandler for Notifications {
    fn freewheel(&mut self, _: &jack::Client, is_enabled: bool) {
        self.send(AudioEvent::Freewheel(is_enabled));
    }

    fn sample_rate(&mut self, _: &jack::Client, srate: jack::Frames) -> jack::Control {
        self.rate_changed(srate)
    }

    fn xrun(&mut self, _: &jack::Client) -> jack::Control {
        self.dropout()
    }
}
