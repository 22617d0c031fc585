use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::WET_CEILING;
use crate::loops::LoopBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing recorded.
    Empty,
    /// First take, length still growing.
    Capturing,
    /// Length fixed; may be paused or overdubbing.
    Looping,
}

/// Copy of the transport for the UI side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportStatus {
    pub mode: Mode,
    pub playing: bool,
    pub recording: bool,
    pub length: usize,
    pub write_head: usize,
}

/// Per-sample loop state machine.
///
/// The engine never fails: invalid combinations are clamped or ignored.
#[derive(Debug)]
pub struct LoopEngine {
    buffer: LoopBuffer,
    mode: Mode,
    playing: bool,
    recording: bool,
    write_head: usize,
    provisional_len: usize,
    wet: f32,
}

/// Engine handle shared by the audio callback and the poll loop.
///
/// The callback only ever `try_lock`s it, so holding the lock on the poll
/// side pauses every buffer mutation.
pub type SharedEngine = Arc<Mutex<LoopEngine>>;

pub fn shared(engine: LoopEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// Lock from the poll side. A panic on the other side must not take the
/// loop down with it.
pub fn lock(engine: &SharedEngine) -> MutexGuard<'_, LoopEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LoopEngine {
    pub fn new(capacity: usize) -> Self {
        LoopEngine {
            buffer: LoopBuffer::new(capacity),
            mode: Mode::Empty,
            playing: false,
            recording: false,
            write_head: 0,
            provisional_len: 0,
            wet: 0.0,
        }
    }

    pub fn buffer(&self) -> &LoopBuffer {
        &self.buffer
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_head(&self) -> usize {
        self.write_head
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn status(&self) -> TransportStatus {
        TransportStatus {
            mode: self.mode,
            playing: self.playing,
            recording: self.recording,
            length: self.buffer.len(),
            write_head: self.write_head,
        }
    }

    /// Set the dry/wet blend from a `0.0..=1.0` control value.
    pub fn set_mix(&mut self, dry_wet: f32) {
        self.wet = dry_wet.clamp(0.0, 1.0) * WET_CEILING;
    }

    /// One audio tick.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.recording {
            self.buffer.add(self.write_head, input);
            if self.mode == Mode::Capturing {
                self.provisional_len += 1;
            }
        }

        let loop_signal = if self.playing {
            self.buffer.get(self.write_head) * self.wet
        } else {
            0.0
        };
        let output = (input + loop_signal).clamp(-1.0, 1.0);

        if self.mode == Mode::Capturing && self.provisional_len >= self.capacity() {
            log::debug!("capture reached capacity, finalizing");
            self.finalize(self.capacity());
        }

        if self.playing {
            self.write_head = (self.write_head + 1) % self.modulus();
        }
        output
    }

    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (in_sample, out_sample) in input.iter().zip(output.iter_mut()) {
            *out_sample = self.process(*in_sample);
        }
    }

    /// Record button edge.
    ///
    /// The first press starts capture together with playback. Pressing again
    /// during the first take fixes the loop length.
    pub fn toggle_record(&mut self) {
        match self.mode {
            Mode::Capturing if self.recording => {
                if self.provisional_len == 0 {
                    // Nothing was captured; act as if record was never pressed.
                    self.return_to_empty();
                    return;
                }
                self.finalize(self.provisional_len);
            }
            Mode::Empty => self.mode = Mode::Capturing,
            _ => {}
        }
        self.playing = true;
        self.recording = !self.recording;
        log::info!(
            "record toggled: recording={} mode={:?} length={}",
            self.recording,
            self.mode,
            self.buffer.len()
        );
    }

    /// Play button edge. Ignored while there is nothing to play.
    pub fn toggle_play(&mut self) {
        if !self.can_play() {
            log::debug!("play ignored: nothing to play");
            return;
        }
        self.playing = !self.playing;
        self.recording = false;
        log::info!("play toggled: playing={}", self.playing);
    }

    /// Erase the loop only when a session is running.
    pub fn hold_reset(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        self.reset();
        true
    }

    /// Back to `Empty` with the touched region zeroed.
    pub fn reset(&mut self) {
        let extent = self.buffer.len().max(self.provisional_len);
        self.buffer.clear(extent);
        self.return_to_empty();
        log::info!("loop reset");
    }

    /// Write one imported sample. Only valid between `reset` and
    /// `finish_load`.
    pub(crate) fn load_sample(&mut self, index: usize, value: f32) {
        self.buffer.set(index, value);
    }

    /// Adopt `total` loaded samples as the loop and start playing it.
    pub(crate) fn finish_load(&mut self, total: usize) {
        self.buffer.set_len(total);
        self.write_head = 0;
        self.provisional_len = 0;
        self.recording = false;
        if self.buffer.is_empty() {
            self.mode = Mode::Empty;
            self.playing = false;
        } else {
            self.mode = Mode::Looping;
            self.playing = true;
        }
    }

    fn can_play(&self) -> bool {
        match self.mode {
            Mode::Empty => self.recording,
            Mode::Capturing => self.recording,
            Mode::Looping => true,
        }
    }

    fn finalize(&mut self, length: usize) {
        self.mode = Mode::Looping;
        self.buffer.set_len(length);
        self.provisional_len = 0;
        self.write_head %= self.buffer.len().max(1);
    }

    fn modulus(&self) -> usize {
        match self.mode {
            Mode::Looping => self.buffer.len().max(1),
            Mode::Empty | Mode::Capturing => self.capacity().max(1),
        }
    }

    fn return_to_empty(&mut self) {
        self.mode = Mode::Empty;
        self.playing = false;
        self.recording = false;
        self.write_head = 0;
        self.provisional_len = 0;
        self.buffer.set_len(0);
    }
}
