// Brush operations over the loop buffer. All of them write through
// WaveformBuffer::set, so every touched sample ends up inside [-A, A].
//
// The radial brushes share one entry point (`apply_brush`) and differ only in
// the `BrushOp` they carry; soften, smear and the two-point draws have their
// own footprints and live beside it.

use super::buffer::WaveformBuffer;
use super::generator::WaveformKind;

// soften always works on a fixed neighbourhood around the pointer
const SOFTEN_REACH: usize = 40;
const SOFTEN_MIN_STRENGTH: f32 = 0.05;

const SMEAR_DEAD_ZONE: usize = 30;
// cumulative drag (as a fraction of the loop) after which smear has fully faded
const SMEAR_FADE_SPAN: f32 = 0.35;
const SMEAR_GAIN: f32 = 1.2;
const SMEAR_MIN_INTENSITY: f32 = 0.01;
const SMEAR_MIN_WEIGHT: f32 = 0.01;

const ARC_MIN_SPAN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// old·(1−w) + target·w
    Replace,
    /// old + target·w
    Add,
    /// old + (target−old)·w·0.7
    Ease,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BrushOp {
    Paint { target: f32, mode: BlendMode },
    /// factor > 1 boosts, < 1 attenuates
    Multiply { factor: f32 },
    /// `pitch` is the pointer height normalised to [0, 1]
    ToneStamp { shape: WaveformKind, pitch: f32 },
}

/// Quadratic falloff `strength·(1 − (d/r)²)` for d < r, else None.
#[inline]
pub fn falloff(idx: usize, center: usize, radius: usize, strength: f32) -> Option<f32> {
    if radius == 0 {
        return None;
    }
    let dist = idx.abs_diff(center) as f32 / radius as f32;
    if dist < 1.0 {
        Some(strength * (1.0 - dist * dist))
    } else {
        None
    }
}

/// Apply a radial brush at `center`. `strength` already folds in the brush
/// intensity and the tool's base multiplier. A zero radius is a no-op.
pub fn apply_brush(
    buffer: &mut WaveformBuffer,
    center: usize,
    radius: usize,
    strength: f32,
    op: BrushOp,
) {
    if radius == 0 {
        return;
    }
    let Some((start, end)) = buffer.span(center, radius) else {
        return;
    };
    let amplitude = buffer.amplitude();

    for i in start..=end {
        let Some(weight) = falloff(i, center, radius, strength) else {
            continue;
        };
        let current = buffer.get(i);
        let new_val = match op {
            BrushOp::Paint { target, mode } => match mode {
                BlendMode::Replace => current * (1.0 - weight) + target * weight,
                BlendMode::Add => current + target * weight,
                BlendMode::Ease => current + (target - current) * weight * 0.7,
            },
            BrushOp::Multiply { factor } => current * (1.0 + (factor - 1.0) * weight),
            BrushOp::ToneStamp { shape, pitch } => {
                let pos = (i - start) as f64 / (end - start + 1) as f64;
                let tone = tone_sample(shape, pitch, pos) as f32;
                current + tone * weight * amplitude * 0.6
            }
        };
        buffer.set(i, new_val);
    }
}

// Display pitch range for tone stamps, in Hz.
const TONE_LOW_HZ: f64 = 50.0;
const TONE_SPAN_HZ: f64 = 400.0;

/// Stamp shape at `pos` ∈ [0, 1) across the brush footprint.
fn tone_sample(shape: WaveformKind, pitch: f32, pos: f64) -> f64 {
    let hz = TONE_LOW_HZ + pitch.clamp(0.0, 1.0) as f64 * TONE_SPAN_HZ;
    let cycles = match shape {
        // one base period plus a pitch-dependent sweep
        WaveformKind::Sine => 1.0 + hz * 0.1 / std::f64::consts::TAU,
        _ => hz * 0.05,
    };
    shape.shape((pos * cycles).fract())
}

/// Triangular-weighted low-pass over ±40 samples around `center`.
/// Below a strength of 0.05 nothing happens; otherwise each sample is pulled
/// toward its local average by `strength·(1 − d/40)`, skipping weak spots.
pub fn soften(buffer: &mut WaveformBuffer, center: usize, strength: f32) {
    if strength.is_nan() || strength < SOFTEN_MIN_STRENGTH {
        return;
    }
    let Some((start, end)) = buffer.span(center, SOFTEN_REACH) else {
        return;
    };
    let len = buffer.len();
    let kernel = (6.0 + strength * 20.0) as usize;
    let norm = (kernel + 1) as f32;

    for i in start..=end {
        let dist = i.abs_diff(center) as f32 / SOFTEN_REACH as f32;
        let envelope = strength * (1.0 - dist);
        if envelope < SOFTEN_MIN_STRENGTH {
            continue;
        }

        let mut sum = buffer.get(i);
        let mut wsum = 1.0f32;
        for j in 1..=kernel {
            let w = 1.0 - j as f32 / norm;
            if i >= j {
                sum += buffer.get(i - j) * w;
                wsum += w;
            }
            if i + j < len {
                sum += buffer.get(i + j) * w;
                wsum += w;
            }
        }
        let smoothed = sum / wsum;
        let current = buffer.get(i);
        buffer.set(i, current * (1.0 - envelope) + smoothed * envelope);
    }
}

/// Drag state for the smear tool: where the drag started and the furthest
/// it has reached so far.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmearDrag {
    anchor: Option<usize>,
    max_distance: f32,
}

impl SmearDrag {
    pub fn begin(&mut self, anchor: usize) {
        self.anchor = Some(anchor);
        self.max_distance = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Copy the region captured around the anchor toward `current`.
    /// Returns whether anything was written.
    pub fn drag_to(
        &mut self,
        buffer: &mut WaveformBuffer,
        current: usize,
        brush_intensity: f32,
        span: f32,
    ) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let len = buffer.len();
        if len == 0 || anchor >= len {
            return false;
        }
        let distance = current.abs_diff(anchor);
        if distance < SMEAR_DEAD_ZONE {
            return false;
        }
        let forward = current > anchor;
        self.max_distance = self.max_distance.max(distance as f32);

        let max_fade = len as f32 * SMEAR_FADE_SPAN;
        let fade = 1.0 - (self.max_distance / max_fade).min(1.0);
        let intensity = brush_intensity * fade * SMEAR_GAIN;
        if intensity <= SMEAR_MIN_INTENSITY {
            return false;
        }

        let half = (50.0 + span.clamp(0.0, 1.0) * 350.0) as usize;
        let capture_start = anchor.saturating_sub(half);
        let capture_end = (anchor + half).min(len - 1);
        let copy_len = capture_end - capture_start + 1;
        let reach = (distance + copy_len) as f32;

        let mut wrote = false;
        for offset in 0..copy_len {
            let src = capture_start + offset;
            let dst = if forward {
                current + offset
            } else {
                match current.checked_sub(offset) {
                    Some(d) => d,
                    None => break,
                }
            };
            if dst >= len {
                break;
            }
            let weight = intensity * (1.0 - dst.abs_diff(anchor) as f32 / reach);
            if weight > SMEAR_MIN_WEIGHT {
                let copied = buffer.get(src);
                let existing = buffer.get(dst);
                buffer.set(dst, existing + copied * weight);
                wrote = true;
            }
        }
        wrote
    }
}

/// A buffer position paired with a sample value, as picked by the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub index: usize,
    pub value: f32,
}

/// Straight line between two anchors, blended into the buffer by `intensity`.
pub fn draw_line(buffer: &mut WaveformBuffer, from: Anchor, to: Anchor, intensity: f32) {
    trace_segment(buffer, from, to, |t| from.value + t * (to.value - from.value), |old, val| {
        val * intensity + old * (1.0 - intensity)
    });
}

/// Half-sine arc between two anchors, offset to their midpoint with an
/// amplitude of half their difference plus a small floor. Spans shorter than
/// ten samples fall back to a line. `additive` layers the arc over the
/// existing content instead of blending toward it.
pub fn draw_arc(
    buffer: &mut WaveformBuffer,
    from: Anchor,
    to: Anchor,
    intensity: f32,
    additive: bool,
) {
    if from.index.abs_diff(to.index) < ARC_MIN_SPAN {
        draw_line(buffer, from, to, intensity);
        return;
    }
    let offset = (from.value + to.value) / 2.0;
    let amplitude = (from.value - to.value).abs() / 2.0 + 0.05 * buffer.amplitude();
    let arc = |t: f32| offset + (std::f32::consts::PI * t).sin() * amplitude;
    if additive {
        trace_segment(buffer, from, to, arc, |old, val| old + val * intensity);
    } else {
        trace_segment(buffer, from, to, arc, |old, val| {
            val * intensity + old * (1.0 - intensity)
        });
    }
}

// Walk every index between two anchors; `shape` maps t ∈ [0,1] to a value,
// `blend` merges it with the old sample.
fn trace_segment(
    buffer: &mut WaveformBuffer,
    from: Anchor,
    to: Anchor,
    shape: impl Fn(f32) -> f32,
    blend: impl Fn(f32, f32) -> f32,
) {
    let steps = from.index.abs_diff(to.index);
    if steps == 0 {
        return;
    }
    let len = buffer.len();
    let dx = to.index as f32 - from.index as f32;
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let idx = (from.index as f32 + t * dx).round();
        if idx < 0.0 || idx as usize >= len {
            continue;
        }
        let idx = idx as usize;
        let old = buffer.get(idx);
        buffer.set(idx, blend(old, shape(t)));
    }
}
