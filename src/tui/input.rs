use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::shared::{InputEvent, Pointer, Tool};
use crate::wave::WaveformKind;
use super::mode::TuiState;

const KNOB_STEP: f32 = 0.05;

// poll for input from the terminal and resolve keys and mouse positions
// into semantic input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(handle_key(key.code)),
        Event::Mouse(mouse) => Ok(handle_mouse(mouse, ts)),
        _ => Ok(vec![]),
    }
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    let event = match code {
        KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,
        KeyCode::Char(' ') => InputEvent::PlayPause,
        KeyCode::Char('e') => InputEvent::Export,
        KeyCode::Char('c') => InputEvent::Clear,

        // sine, square, saw, triangle
        KeyCode::Char(c @ '1'..='4') => InputEvent::SelectWave(WaveformKind::CLASSIC[c as usize - '1' as usize]),
        KeyCode::Up => InputEvent::FrequencyUp,
        KeyCode::Down => InputEvent::FrequencyDown,

        KeyCode::Tab => InputEvent::NextTool,
        KeyCode::BackTab => InputEvent::PrevTool,

        // knobs
        KeyCode::Char('[') => InputEvent::AdjustIntensity(-KNOB_STEP),
        KeyCode::Char(']') => InputEvent::AdjustIntensity(KNOB_STEP),
        KeyCode::Char('-') => InputEvent::AdjustSmearSpan(-KNOB_STEP),
        KeyCode::Char('=') => InputEvent::AdjustSmearSpan(KNOB_STEP),

        KeyCode::Char(c) => match Tool::from_hotkey(c) {
            Some(tool) => InputEvent::SelectTool(tool),
            None => return vec![],
        },
        _ => return vec![],
    };
    vec![event]
}

fn handle_mouse(mouse: MouseEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if contains(ts.wave_area, col, row) {
                ts.dragging = true;
                return resolve_pointer(ts, col, row).map(InputEvent::PointerDown).into_iter().collect();
            }
            ts.palette
                .iter()
                .find(|(cell, _)| contains(*cell, col, row))
                .map(|&(_, tool)| InputEvent::SelectTool(tool))
                .into_iter()
                .collect()
        }
        // a drag that started in the waveform keeps editing even past its edges
        MouseEventKind::Drag(MouseButton::Left) if ts.dragging => {
            resolve_pointer(ts, col, row).map(InputEvent::PointerDrag).into_iter().collect()
        }
        MouseEventKind::Up(MouseButton::Left) if ts.dragging => {
            ts.dragging = false;
            vec![InputEvent::PointerUp]
        }
        _ => vec![],
    }
}

fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

// map a terminal cell onto a buffer index and a [-1, 1] height, clamped to the area
pub fn resolve_pointer(ts: &TuiState, col: u16, row: u16) -> Option<Pointer> {
    let area = ts.wave_area;
    if area.width == 0 || area.height == 0 || ts.buffer_len == 0 {
        return None;
    }
    let rel_col = col.saturating_sub(area.x).min(area.width - 1) as usize;
    let index = (rel_col * ts.buffer_len / area.width as usize).min(ts.buffer_len - 1);

    let rel_row = row.saturating_sub(area.y).min(area.height - 1) as f32;
    let half = area.height as f32 / 2.0;
    let y = ((half - (rel_row + 0.5)) / half).clamp(-1.0, 1.0);

    Some(Pointer { index, y })
}
