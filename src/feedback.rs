use std::time::Duration;

use crate::engine::TransportStatus;

/// How the core talks back to the operator.
pub trait Feedback {
    /// Show a transient message and keep it up for `hold`.
    fn message(&mut self, text: &str, hold: Duration);

    /// Mirror the transport on the play/record indicators.
    fn transport(&mut self, status: &TransportStatus);

    /// Signal that the loop has been erased.
    fn reset_flash(&mut self);
}

/// Play and record lamps.
pub trait Indicator {
    fn set(&mut self, play: bool, record: bool);
}

/// Stand-in when no lamps are wired.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set(&mut self, play: bool, record: bool) {
        log::debug!("leds: play={play} record={record}");
    }
}

/// Hold times of the transient messages, in milliseconds.
pub mod hold {
    pub const BRIEF: u64 = 500;
    pub const SHORT: u64 = 800;
    pub const NORMAL: u64 = 1000;
    pub const ERROR: u64 = 1200;
    pub const LONG: u64 = 1500;
    pub const PROGRESS: u64 = 30;
    pub const LOAD_PROGRESS: u64 = 10;
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
