use crate::audio_api::AudioCommand;

/// Turns the loop buffer into a continuous stream at the device rate by
/// walking a fractional phase through it with linear interpolation.
#[derive(Clone, Debug)]
pub struct PlaybackResampler {
    phase: f64,     // read position in [0, N)
    increment: f64, // buffer samples per output sample
    playing: bool,
}

impl PlaybackResampler {
    pub fn new(increment: f64) -> Self {
        let increment = if increment.is_finite() && increment > 0.0 { increment } else { 1.0 };
        Self {
            phase: 0.0,
            increment,
            playing: false,
        }
    }

    /// Buffer samples to advance per device sample: 1.0 when the device runs
    /// at the buffer's native rate.
    pub fn increment_for(native_rate: u32, device_rate: u32) -> f64 {
        if device_rate == 0 {
            return 1.0;
        }
        native_rate as f64 / device_rate as f64
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::SetPlaying(on) => self.set_playing(on),
            AudioCommand::Restart => self.phase = 0.0,
        }
    }

    pub fn set_playing(&mut self, on: bool) {
        if on && !self.playing {
            self.phase = 0.0; // no resume-from-pause
        }
        self.playing = on;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Next output sample. Silence when stopped or when no buffer is available yet.
    pub fn next_sample(&mut self, buffer: Option<&[f32]>) -> f32 {
        let Some(data) = buffer else {
            return 0.0;
        };
        if !self.playing || data.is_empty() {
            return 0.0;
        }
        let len = data.len();
        let n = len as f64;
        if !self.phase.is_finite() || self.phase < 0.0 || self.phase >= n {
            self.phase = if self.phase.is_finite() { self.phase.rem_euclid(n) } else { 0.0 };
        }

        let floor = self.phase.floor();
        let idx = (floor as usize) % len;
        let frac = (self.phase - floor) as f32;
        let a = data[idx];
        let b = data[(idx + 1) % len];
        let out = a + (b - a) * frac;

        self.phase += self.increment;
        if self.phase >= n {
            self.phase -= n;
            if self.phase >= n {
                self.phase = self.phase.rem_euclid(n);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(increment: f64) -> PlaybackResampler {
        let mut r = PlaybackResampler::new(increment);
        r.set_playing(true);
        r
    }

    #[test]
    fn stopped_or_unset_is_silent() {
        let data = [0.3f32; 8];
        let mut r = PlaybackResampler::new(1.0);
        assert_eq!(r.next_sample(Some(&data)), 0.0);
        r.set_playing(true);
        assert_eq!(r.next_sample(None), 0.0);
        assert_eq!(r.next_sample(Some(&[])), 0.0);
        assert_eq!(r.next_sample(Some(&data)), 0.3);
    }

    #[test]
    fn unit_increment_reproduces_buffer_and_wraps() {
        let data = [0.0f32, 0.1, 0.2, 0.3];
        let mut r = playing(1.0);
        let out: Vec<f32> = (0..6).map(|_| r.next_sample(Some(&data))).collect();
        assert_eq!(out, vec![0.0, 0.1, 0.2, 0.3, 0.0, 0.1]);
    }

    #[test]
    fn half_increment_interpolates_across_wrap() {
        let data = [0.0f32, 0.2, 0.1, -0.2];
        let mut r = playing(0.5);
        let out: Vec<f32> = (0..8).map(|_| r.next_sample(Some(&data))).collect();
        let expected = [0.0, 0.1, 0.2, 0.15, 0.1, -0.05, -0.2, -0.1];
        for (o, e) in out.iter().zip(expected) {
            assert!((o - e).abs() < 1e-6, "{out:?}");
        }
    }

    #[test]
    fn read_index_stays_in_bounds_for_awkward_increments() {
        let data: Vec<f32> = (0..7).map(|i| i as f32 * 0.01).collect();
        for &inc in &[1e-9, 0.3333333, 1.0, 1.0 + 1e-12, 6.999999, 7.0, 13.5, 1e6] {
            let mut r = playing(inc);
            for _ in 0..20_000 {
                let s = r.next_sample(Some(&data));
                assert!(s.is_finite());
                assert!(r.phase() >= 0.0 && r.phase() < data.len() as f64, "inc {inc}");
            }
        }
    }

    #[test]
    fn resuming_restarts_from_loop_start() {
        let data = [0.0f32, 0.1, 0.2, 0.3];
        let mut r = playing(1.0);
        r.next_sample(Some(&data));
        r.next_sample(Some(&data));
        r.handle_cmd(AudioCommand::SetPlaying(false));
        assert_eq!(r.next_sample(Some(&data)), 0.0);
        r.handle_cmd(AudioCommand::SetPlaying(true));
        assert_eq!(r.next_sample(Some(&data)), 0.0);
        assert_eq!(r.next_sample(Some(&data)), 0.1);
        // already playing: no reset
        r.handle_cmd(AudioCommand::SetPlaying(true));
        assert_eq!(r.next_sample(Some(&data)), 0.2);
        r.handle_cmd(AudioCommand::Restart);
        assert_eq!(r.next_sample(Some(&data)), 0.0);
    }

    #[test]
    fn shorter_snapshot_never_reads_out_of_range() {
        let long = [0.1f32; 100];
        let short = [0.2f32; 3];
        let mut r = playing(1.0);
        for _ in 0..50 {
            r.next_sample(Some(&long));
        }
        assert_eq!(r.next_sample(Some(&short)), 0.2);
        assert!(r.phase() < 3.0);
    }

    #[test]
    fn increment_matches_rate_ratio() {
        assert_eq!(PlaybackResampler::increment_for(48_000, 48_000), 1.0);
        assert!((PlaybackResampler::increment_for(48_000, 44_100) - 1.088435).abs() < 1e-6);
        assert_eq!(PlaybackResampler::increment_for(48_000, 0), 1.0);
        assert_eq!(PlaybackResampler::new(f64::NAN).next_sample(None), 0.0);
    }
}
