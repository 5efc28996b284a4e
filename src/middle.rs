// The middle layer: owns the loop buffer, the brush state and the selected
// tool, turns resolved InputEvents into engine calls, and hands the TUI a
// DisplayState to draw. Anything the audio thread needs comes back out as
// AudioCommands plus a "dirty" flag telling main to publish a new snapshot.

use std::path::{Path, PathBuf};

use crate::audio_api::AudioCommand;
use crate::pipeline::project::{EngineConfig, SessionState};
use crate::shared::{DisplayState, InputEvent, Pointer, Tool};
use crate::wave::edit;
use crate::wave::{
    Anchor, BlendMode, BrushOp, SmearDrag, WavExporter, WaveformBuffer, WaveformKind, generate, load_loop,
};

const STATUS_SECONDS: f64 = 2.0;
const FREQ_STEP: f64 = 1.1;
// painted values stay a little inside the ceiling
const PAINT_HEADROOM: f32 = 0.8;
// tool radii are given against a view this many points wide
const REFERENCE_VIEW_WIDTH: f64 = 1400.0;

// How a tool touches the buffer once the pointer has been resolved
#[derive(Clone, Copy, Debug, PartialEq)]
enum ToolAction {
    Paint(BlendMode),
    // continuous = amplify ramp, otherwise a binary boost/cut
    Multiply { continuous: bool },
    ToneStamp(WaveformKind),
    Soften,
    Smear,
    Line,
    Arc { additive: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ToolSpec {
    radius_points: usize, // brush radius in points of the reference view width
    base_strength: f32,
    action: ToolAction,
}

fn tool_spec(tool: Tool) -> ToolSpec {
    let spec = |radius_points, base_strength, action| ToolSpec { radius_points, base_strength, action };
    match tool {
        Tool::Free => spec(15, 1.0, ToolAction::Paint(BlendMode::Replace)),
        Tool::Smooth => spec(25, 0.6, ToolAction::Paint(BlendMode::Replace)),
        Tool::AddFree => spec(15, 1.0, ToolAction::Paint(BlendMode::Add)),
        Tool::AddSmooth => spec(25, 0.6, ToolAction::Paint(BlendMode::Add)),
        Tool::Blend => spec(25, 0.6, ToolAction::Paint(BlendMode::Ease)),
        Tool::Multiply => spec(25, 1.0, ToolAction::Multiply { continuous: false }),
        Tool::Amplify => spec(25, 1.0, ToolAction::Multiply { continuous: true }),
        Tool::AddSine => spec(30, 0.8, ToolAction::ToneStamp(WaveformKind::Sine)),
        Tool::AddSquare => spec(30, 0.8, ToolAction::ToneStamp(WaveformKind::Square)),
        Tool::AddSaw => spec(30, 0.8, ToolAction::ToneStamp(WaveformKind::Sawtooth)),
        Tool::AddTri => spec(30, 0.8, ToolAction::ToneStamp(WaveformKind::Triangle)),
        Tool::Soften => spec(0, 1.0, ToolAction::Soften),
        Tool::Smear => spec(0, 1.0, ToolAction::Smear),
        Tool::Line => spec(0, 1.0, ToolAction::Line),
        Tool::SineSeg => spec(0, 1.0, ToolAction::Arc { additive: false }),
        Tool::AddArc => spec(0, 1.0, ToolAction::Arc { additive: true }),
    }
}

// Per-tool pointer state; cleared on tool change and on release
#[derive(Clone, Debug, Default)]
struct BrushState {
    drawing: bool,
    line_anchor: Option<Anchor>,
    smear: SmearDrag,
}

impl BrushState {
    fn reset(&mut self) {
        self.drawing = false;
        self.line_anchor = None;
        self.smear.reset();
    }
}

pub struct Middle {
    config: EngineConfig,
    buffer: WaveformBuffer,
    pub session: SessionState,
    brush: BrushState,
    playing: bool,
    audio_live: bool,
    exporter: WavExporter,
    status: Option<(String, f64)>, // text, seconds left
    dirty: bool,
}

impl Middle {
    pub fn new(config: EngineConfig, session: SessionState, export_dir: impl Into<PathBuf>) -> Self {
        let mut buffer = WaveformBuffer::new(config.buffer_len(), config.amplitude);
        let exporter = WavExporter::new(export_dir, config.export_prefix.clone(), config.sample_rate);
        let mut session = session;
        session.brush_intensity = session.brush_intensity.clamp(0.0, 1.0);
        session.smear_span = session.smear_span.clamp(0.0, 1.0);
        if !(session.frequency.is_finite() && session.frequency >= config.min_frequency) {
            session.frequency = config.default_frequency.max(config.min_frequency);
        }
        if session.kind != WaveformKind::Custom {
            session.frequency = generate(session.kind, session.frequency, config.loop_seconds, &mut buffer);
        }
        Self {
            config,
            buffer,
            session,
            brush: BrushState::default(),
            playing: true,
            audio_live: false,
            exporter,
            status: None,
            dirty: true,
        }
    }

    pub fn samples(&self) -> &[f32] {
        self.buffer.samples()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_audio_live(&mut self, live: bool) {
        self.audio_live = live;
    }

    // True once after every change to the buffer; main publishes a snapshot then
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // Replace the loop with a WAV from disk; the result counts as user-authored.
    // A file that can't be read leaves the buffer alone and shows up in the status line.
    pub fn load_seed(&mut self, path: &Path) {
        match load_loop(path, self.buffer.len()) {
            Ok(samples) => {
                self.buffer.fill_from(&samples);
                self.session.kind = WaveformKind::Custom;
                self.dirty = true;
                log::info!("seeded loop from {}", path.display());
                self.set_status(format!("Loaded {}", path.display()));
            }
            Err(e) => {
                log::error!("import of {} failed: {e:#}", path.display());
                self.set_status(format!("Import failed: {e}"));
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerDrag(p) => self.pointer_drag(p),
            InputEvent::PointerUp => {
                self.brush.drawing = false;
                self.brush.smear.reset();
            }

            InputEvent::SelectTool(tool) => self.select_tool(tool),
            InputEvent::NextTool => self.select_tool(self.session.tool.next()),
            InputEvent::PrevTool => self.select_tool(self.session.tool.prev()),

            InputEvent::SelectWave(kind) => {
                if kind != WaveformKind::Custom {
                    self.session.kind = kind;
                    return self.regenerate();
                }
            }
            InputEvent::FrequencyUp => {
                if self.session.kind != WaveformKind::Custom {
                    self.session.frequency *= FREQ_STEP;
                    return self.regenerate();
                }
            }
            InputEvent::FrequencyDown => {
                if self.session.kind != WaveformKind::Custom {
                    self.session.frequency = (self.session.frequency / FREQ_STEP).max(self.config.min_frequency);
                    return self.regenerate();
                }
            }
            InputEvent::Clear => {
                self.session.kind = WaveformKind::Custom;
                self.buffer.clear();
                self.dirty = true;
            }

            InputEvent::PlayPause => {
                self.playing = !self.playing;
                return vec![AudioCommand::SetPlaying(self.playing)];
            }
            InputEvent::Export => self.export(),

            InputEvent::AdjustIntensity(delta) => {
                self.session.brush_intensity = (self.session.brush_intensity + delta).clamp(0.0, 1.0);
            }
            InputEvent::AdjustSmearSpan(delta) => {
                self.session.smear_span = (self.session.smear_span + delta).clamp(0.0, 1.0);
            }

            InputEvent::Quit => {}
        }
        vec![]
    }

    // Seconds since the last tick; ages the status line
    pub fn tick(&mut self, elapsed: f64) {
        if let Some((_, left)) = &mut self.status {
            *left -= elapsed;
            if *left <= 0.0 {
                self.status = None;
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            kind: self.session.kind,
            frequency: self.session.frequency,
            tool: self.session.tool,
            brush_intensity: self.session.brush_intensity,
            smear_span: self.session.smear_span,
            playing: self.playing,
            audio_live: self.audio_live,
            pending_anchor: self.brush.line_anchor.map(|a| a.index).or(self.brush.smear.anchor()),
            status_text: self.status.as_ref().map(|(s, _)| s.clone()).unwrap_or_default(),
            buffer_len: self.buffer.len(),
            amplitude: self.buffer.amplitude(),
        }
    }

    fn set_status(&mut self, text: String) {
        self.status = Some((text, STATUS_SECONDS));
    }

    fn select_tool(&mut self, tool: Tool) {
        self.session.tool = tool;
        self.brush.reset();
    }

    fn regenerate(&mut self) -> Vec<AudioCommand> {
        self.session.frequency = generate(
            self.session.kind,
            self.session.frequency,
            self.config.loop_seconds,
            &mut self.buffer,
        );
        self.dirty = true;
        vec![AudioCommand::Restart]
    }

    fn export(&mut self) {
        match self.exporter.export(self.buffer.samples()) {
            Ok(path) => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                self.set_status(format!("Saved {name}"));
            }
            Err(e) => {
                log::error!("export to {} failed: {e:#}", self.exporter.dir().display());
                self.set_status(format!("Export failed: {e}"));
            }
        }
    }

    // ── pointer → engine ──────────────────────────────────────────

    fn pointer_value(&self, p: Pointer) -> f32 {
        p.y.clamp(-1.0, 1.0) * self.buffer.amplitude() * PAINT_HEADROOM
    }

    fn pointer_index(&self, p: Pointer) -> usize {
        p.index.min(self.buffer.len().saturating_sub(1))
    }

    // Brush footprints are a fixed share of the loop, whatever the terminal width
    fn radius_samples(&self, spec: ToolSpec) -> usize {
        let points = spec.radius_points as f64;
        (self.buffer.len() as f64 * points / REFERENCE_VIEW_WIDTH).round() as usize
    }

    fn pointer_down(&mut self, p: Pointer) {
        self.session.kind = WaveformKind::Custom;
        let index = self.pointer_index(p);
        let spec = tool_spec(self.session.tool);
        let intensity = self.session.brush_intensity;

        match spec.action {
            ToolAction::Line | ToolAction::Arc { .. } => {
                let here = Anchor { index, value: self.pointer_value(p) };
                match self.brush.line_anchor.take() {
                    None => self.brush.line_anchor = Some(here),
                    Some(start) => {
                        match spec.action {
                            ToolAction::Arc { additive } => edit::draw_arc(&mut self.buffer, start, here, intensity, additive),
                            _ => edit::draw_line(&mut self.buffer, start, here, intensity),
                        }
                        self.dirty = true;
                    }
                }
            }
            ToolAction::Smear => {
                self.brush.drawing = true;
                self.brush.smear.begin(index);
            }
            _ => self.brush.drawing = true,
        }
    }

    fn pointer_drag(&mut self, p: Pointer) {
        if !self.brush.drawing {
            return;
        }
        let index = self.pointer_index(p);
        let y = p.y.clamp(-1.0, 1.0);
        let spec = tool_spec(self.session.tool);
        let intensity = self.session.brush_intensity;
        let strength = spec.base_strength * intensity;
        let radius = self.radius_samples(spec);

        match spec.action {
            ToolAction::Paint(mode) => {
                let target = self.pointer_value(p);
                edit::apply_brush(&mut self.buffer, index, radius, strength, BrushOp::Paint { target, mode });
            }
            ToolAction::Multiply { continuous } => {
                let factor = if continuous {
                    if y > 0.0 { 1.0 + y * 3.0 } else { 1.0 + y * 0.8 }
                } else if y > 0.0 {
                    1.5
                } else {
                    0.7
                };
                edit::apply_brush(&mut self.buffer, index, radius, strength, BrushOp::Multiply { factor });
            }
            ToolAction::ToneStamp(shape) => {
                let pitch = (y + 1.0) / 2.0;
                edit::apply_brush(&mut self.buffer, index, radius, strength, BrushOp::ToneStamp { shape, pitch });
            }
            ToolAction::Soften => {
                // lower on the screen = stronger treble cut
                let pointer_strength = if y < 0.0 { 1.0 - y } else { 0.4 };
                edit::soften(&mut self.buffer, index, intensity * pointer_strength);
            }
            ToolAction::Smear => {
                let span = self.session.smear_span;
                if !self.brush.smear.drag_to(&mut self.buffer, index, intensity, span) {
                    return;
                }
            }
            ToolAction::Line | ToolAction::Arc { .. } => return,
        }
        self.dirty = true;
    }
}
