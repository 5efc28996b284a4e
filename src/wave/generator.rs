use serde::{Deserialize, Serialize};

use super::buffer::WaveformBuffer;

/// What the loop buffer currently holds. Anything but `Custom` was produced
/// by [`generate`] and may be regenerated freely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformKind {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Custom,
}

impl WaveformKind {
    pub const CLASSIC: [WaveformKind; 4] = [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Sawtooth,
        WaveformKind::Triangle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WaveformKind::Sine => "Sine",
            WaveformKind::Square => "Square",
            WaveformKind::Sawtooth => "Sawtooth",
            WaveformKind::Triangle => "Triangle",
            WaveformKind::Custom => "Custom",
        }
    }

    /// One period of the shape at `phase` in [0, 1), in [-1, 1].
    /// `Custom` has no analytic shape and yields silence.
    pub fn shape(self, phase: f64) -> f64 {
        match self {
            WaveformKind::Sine => (std::f64::consts::TAU * phase).sin(),
            WaveformKind::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveformKind::Sawtooth => 2.0 * phase - 1.0,
            // zero at the loop start, peak at a quarter period, like the sine
            WaveformKind::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            WaveformKind::Custom => 0.0,
        }
    }
}

/// Whole cycles that fit the loop for `requested` Hz; never fewer than one.
pub fn cycles_for(requested: f64, loop_seconds: f64) -> u64 {
    let cycles = (requested * loop_seconds).round();
    if cycles.is_finite() && cycles >= 1.0 {
        cycles as u64
    } else {
        1
    }
}

/// Fill `buffer` with `kind` at the nearest frequency that completes a whole
/// number of periods across the loop, so the wrap from N-1 back to 0 is seamless.
/// Returns the snapped frequency. `Custom` leaves the buffer untouched.
pub fn generate(
    kind: WaveformKind,
    requested: f64,
    loop_seconds: f64,
    buffer: &mut WaveformBuffer,
) -> f64 {
    let num_cycles = cycles_for(requested, loop_seconds);
    let actual = num_cycles as f64 / loop_seconds;
    if kind == WaveformKind::Custom || buffer.is_empty() {
        return actual;
    }

    let amplitude = buffer.amplitude() as f64;
    let samples_per_cycle = buffer.len() as f64 / num_cycles as f64;
    for i in 0..buffer.len() {
        let phase = (i as f64 / samples_per_cycle).fract();
        buffer.set(i, (kind.shape(phase) * amplitude) as f32);
    }
    log::debug!(
        "generated {} at {:.3} Hz ({} cycles, requested {:.3} Hz)",
        kind.label(),
        actual,
        num_cycles,
        requested
    );
    actual
}
