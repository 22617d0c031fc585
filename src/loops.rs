/// Backing store of the loop.
///
/// Allocated once with a fixed capacity and never resized. Every write goes
/// through [`LoopBuffer::add`] or [`LoopBuffer::set`], both of which clamp to
/// `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct LoopBuffer {
    samples: Box<[f32]>,
    /// Active loop length in samples, at most `capacity()`.
    len: usize,
}

impl LoopBuffer {
    pub fn new(capacity: usize) -> Self {
        LoopBuffer {
            samples: vec![0.0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fix the active length. Values past the capacity are cut down to it.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity());
    }

    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.samples.get(index).copied().unwrap_or(0.0)
    }

    /// Sum `value` onto the sample at `index`.
    #[inline]
    pub fn add(&mut self, index: usize, value: f32) {
        if let Some(sample) = self.samples.get_mut(index) {
            *sample = (*sample + value).clamp(-1.0, 1.0);
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(sample) = self.samples.get_mut(index) {
            *sample = value.clamp(-1.0, 1.0);
        }
    }

    /// The active region `0..len`.
    pub fn active(&self) -> &[f32] {
        &self.samples[..self.len]
    }

    /// Zero `0..extent` and drop the loop length.
    pub fn clear(&mut self, extent: usize) {
        let extent = extent.min(self.capacity());
        self.samples[..extent].fill(0.0);
        self.len = 0;
    }
}
