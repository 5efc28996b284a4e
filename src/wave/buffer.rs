// The loop buffer: one seamless cycle of mono audio, fixed length, hard amplitude ceiling.
// Every write goes through `set`, so the ceiling holds after any operation.

#[derive(Clone, Debug)]
pub struct WaveformBuffer {
    samples: Vec<f32>,
    amplitude: f32,
}

impl WaveformBuffer {
    pub fn new(len: usize, amplitude: f32) -> Self {
        Self {
            samples: vec![0.0; len],
            amplitude: amplitude.abs(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        self.samples[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: f32) {
        self.samples[idx] = self.clamp(value);
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(-self.amplitude, self.amplitude)
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    // Replace the contents from `src`; extra source samples are ignored,
    // missing ones become silence.
    pub fn fill_from(&mut self, src: &[f32]) {
        for (i, slot) in self.samples.iter_mut().enumerate() {
            let v = src.get(i).copied().unwrap_or(0.0);
            *slot = if v.is_nan() {
                0.0
            } else {
                v.clamp(-self.amplitude, self.amplitude)
            };
        }
    }

    // Affected range of a centred edit, clamped to the buffer: [max(0,c-r), min(N-1,c+r)].
    // None when the buffer is empty or the centre lies outside it.
    pub fn span(&self, center: usize, radius: usize) -> Option<(usize, usize)> {
        if self.samples.is_empty() || center >= self.samples.len() {
            return None;
        }
        let start = center.saturating_sub(radius);
        let end = (center + radius).min(self.samples.len() - 1);
        Some((start, end))
    }
}
