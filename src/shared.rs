// Types shared between the TUI and the middle layer.
//
// Controls (resolved to InputEvents by tui::input):
//   mouse drag in the waveform    //  PointerDown / PointerDrag / PointerUp
//   Tab / Shift-Tab               //  NextTool / PrevTool
//   1 2 3 4                       //  SelectWave(Sine | Square | Sawtooth | Triangle)
//   Up / Down                     //  FrequencyUp / FrequencyDown
//   Space                         //  PlayPause
//   c                             //  Clear (buffer becomes Custom)
//   e                             //  Export
//   [ / ]                         //  AdjustIntensity(-0.05 / 0.05)
//   - / =                         //  AdjustSmearSpan(-0.05 / 0.05)
//   Esc / q                       //  Quit
//   letters in the palette        //  SelectTool(..), see Tool::hotkey
//
// The TUI only resolves screen positions; the middle layer owns every piece of
// engine state and hands back a DisplayState to draw each frame.

use serde::{Deserialize, Serialize};
use crate::wave::WaveformKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Free,
    Line,
    SineSeg,
    Smooth,
    AddFree,
    AddSmooth,
    Multiply,
    Amplify,
    AddSine,
    AddSquare,
    AddSaw,
    AddTri,
    Blend,
    Smear,
    Soften,
    AddArc,
}

impl Tool {
    pub const ALL: [Tool; 16] = [
        Tool::Free,
        Tool::Line,
        Tool::SineSeg,
        Tool::Smooth,
        Tool::AddFree,
        Tool::AddSmooth,
        Tool::Multiply,
        Tool::Amplify,
        Tool::AddSine,
        Tool::AddSquare,
        Tool::AddSaw,
        Tool::AddTri,
        Tool::Blend,
        Tool::Smear,
        Tool::Soften,
        Tool::AddArc,
    ];

    fn position(self) -> usize {
        Tool::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Tool::ALL[(self.position() + 1) % Tool::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Tool::ALL[(self.position() + Tool::ALL.len() - 1) % Tool::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Free => "Free Draw",
            Tool::Line => "Line",
            Tool::SineSeg => "Sine Seg",
            Tool::Smooth => "Smooth",
            Tool::AddFree => "Add Free",
            Tool::AddSmooth => "Add Smooth",
            Tool::Multiply => "Multiply",
            Tool::Amplify => "Amplify",
            Tool::AddSine => "Add Sine",
            Tool::AddSquare => "Add Square",
            Tool::AddSaw => "Add Saw",
            Tool::AddTri => "Add Tri",
            Tool::Blend => "Blend",
            Tool::Smear => "Smear",
            Tool::Soften => "Soften",
            Tool::AddArc => "Add Arc",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Tool::Free => 'f',
            Tool::Line => 'l',
            Tool::SineSeg => 's',
            Tool::Smooth => 'm',
            Tool::AddFree => 'a',
            Tool::AddSmooth => 'd',
            Tool::Multiply => 'x',
            Tool::Amplify => 'p',
            Tool::AddSine => 'i',
            Tool::AddSquare => 'u',
            Tool::AddSaw => 'w',
            Tool::AddTri => 't',
            Tool::Blend => 'b',
            Tool::Smear => 'r',
            Tool::Soften => 'o',
            Tool::AddArc => 'k',
        }
    }

    pub fn from_hotkey(c: char) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.hotkey() == c)
    }
}

// Where the pointer is over the waveform, already resolved by the TUI
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub index: usize, // buffer index under the pointer
    pub y: f32,       // height in [-1, 1], +1 at the top
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(Pointer),
    PointerDrag(Pointer),
    PointerUp,

    SelectTool(Tool),
    NextTool,
    PrevTool,

    SelectWave(WaveformKind),
    FrequencyUp,
    FrequencyDown,
    Clear,

    PlayPause,
    Export,

    AdjustIntensity(f32),
    AdjustSmearSpan(f32),

    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub kind: WaveformKind,
    pub frequency: f64,
    pub tool: Tool,
    pub brush_intensity: f32,
    pub smear_span: f32,
    pub playing: bool,
    pub audio_live: bool,
    pub pending_anchor: Option<usize>, // armed line/arc start or smear origin
    pub status_text: String,
    pub buffer_len: usize,
    pub amplitude: f32,
}
