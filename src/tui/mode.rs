use ratatui::layout::Rect;
use crate::shared::Tool;

// state local to the tui: where things were drawn last frame, so mouse
// positions can be resolved into semantic inputevents
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub wave_area: Rect,                // inner area of the waveform canvas
    pub palette: Vec<(Rect, Tool)>,     // clickable tool cells
    pub buffer_len: usize,              // synced from DisplayState each frame
    pub dragging: bool,                 // left button went down inside the waveform
}
