use std::time::{Duration, Instant};

use crate::config::MIX_STEPS;
use crate::engine::LoopEngine;

/// Longest silence between two reset gestures that still counts as one
/// hold. Covers the usual key auto-repeat delay.
const REPEAT_GAP: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Play,
    Record,
}

/// Input from whatever control surface is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    MenuTurn(i32),
    MenuPress,
    MixTurn(i32),
    Button { id: ButtonId, pressed: bool },
    /// Reset key, for surfaces that cannot report two held buttons. It has
    /// to keep arriving (key auto-repeat) for the hold time to erase.
    ResetGesture,
    Quit,
}

#[derive(Debug, Default)]
struct Button {
    down_since: Option<Instant>,
    rising: bool,
}

impl Button {
    fn set(&mut self, pressed: bool, now: Instant) {
        match (pressed, self.down_since) {
            (true, None) => {
                self.down_since = Some(now);
                self.rising = true;
            }
            (false, Some(_)) => self.down_since = None,
            _ => {}
        }
    }

    fn take_rising(&mut self) -> bool {
        std::mem::take(&mut self.rising)
    }

    fn held(&self, now: Instant) -> Duration {
        self.down_since
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since))
    }
}

/// What `Controls::update` did to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub transport_changed: bool,
    pub erased: bool,
}

/// Button edges, hold timers and encoder accumulators between polls.
#[derive(Debug)]
pub struct Controls {
    play: Button,
    record: Button,
    reset_hold: Duration,
    reset_key: Option<RepeatRun>,
    mix: i32,
    mix_dirty: bool,
    menu_delta: i32,
    menu_pressed: bool,
    quit: bool,
}

/// Unbroken run of reset gestures, from key auto-repeat.
#[derive(Debug, Clone, Copy)]
struct RepeatRun {
    since: Instant,
    last: Instant,
}

impl RepeatRun {
    fn live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) <= REPEAT_GAP
    }
}

impl Controls {
    pub fn new(reset_hold: Duration) -> Self {
        Controls {
            play: Button::default(),
            record: Button::default(),
            reset_hold,
            reset_key: None,
            mix: 0,
            mix_dirty: true,
            menu_delta: 0,
            menu_pressed: false,
            quit: false,
        }
    }

    pub fn apply(&mut self, event: ControlEvent, now: Instant) {
        match event {
            ControlEvent::MenuTurn(delta) => self.menu_delta += delta,
            ControlEvent::MenuPress => self.menu_pressed = true,
            ControlEvent::MixTurn(delta) => {
                self.mix = (self.mix + delta).clamp(0, MIX_STEPS);
                self.mix_dirty = true;
            }
            ControlEvent::Button {
                id: ButtonId::Play,
                pressed,
            } => self.play.set(pressed, now),
            ControlEvent::Button {
                id: ButtonId::Record,
                pressed,
            } => self.record.set(pressed, now),
            ControlEvent::ResetGesture => {
                self.reset_key = match self.reset_key {
                    Some(run) if run.live(now) => Some(RepeatRun { last: now, ..run }),
                    _ => Some(RepeatRun {
                        since: now,
                        last: now,
                    }),
                };
            }
            ControlEvent::Quit => self.quit = true,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Dry/wet position in `0.0..=1.0`.
    pub fn mix(&self) -> f32 {
        self.mix as f32 / MIX_STEPS as f32
    }

    /// Menu encoder movement and press since the last call.
    pub fn take_menu(&mut self) -> (i32, bool) {
        (
            std::mem::take(&mut self.menu_delta),
            std::mem::take(&mut self.menu_pressed),
        )
    }

    /// Whether `update` has anything to do, so idle polls can leave the
    /// engine alone.
    pub fn pending(&self, now: Instant) -> bool {
        self.mix_dirty
            || self.play.rising
            || self.record.rising
            || (self.play.down_since.is_some() && self.record.down_since.is_some())
            || self.reset_key.is_some_and(|run| run.live(now))
    }

    /// Apply the mix and any pending button gestures to the engine.
    ///
    /// Record is handled before the reset gesture and play after it.
    pub fn update(&mut self, engine: &mut LoopEngine, now: Instant) -> Outcome {
        let mut outcome = Outcome::default();
        if std::mem::take(&mut self.mix_dirty) {
            engine.set_mix(self.mix());
        }

        if self.record.take_rising() {
            engine.toggle_record();
            outcome.transport_changed = true;
        }

        if self.reset_held(now) && engine.hold_reset() {
            self.reset_key = None;
            outcome.transport_changed = true;
            outcome.erased = true;
        }

        if self.play.take_rising() {
            engine.toggle_play();
            outcome.transport_changed = true;
        }
        outcome
    }

    /// Both buttons, or the reset key, held for at least `reset_hold`.
    fn reset_held(&mut self, now: Instant) -> bool {
        let buttons =
            self.play.held(now) >= self.reset_hold && self.record.held(now) >= self.reset_hold;
        let key = match self.reset_key {
            Some(run) if run.live(now) => {
                run.last.saturating_duration_since(run.since) >= self.reset_hold
            }
            Some(_) => {
                self.reset_key = None;
                false
            }
            None => false,
        };
        buttons || key
    }
}
