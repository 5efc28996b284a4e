use crate::shared::DisplayState;
use crate::wave::WaveformKind;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid;
use super::mode::TuiState;

const HELP: &str =
    "drag: edit  tab: tool  1-4: wave  up/down: freq  [ ]: intensity  - =: smear  space: play  e: export  c: clear  q: quit";

// Draw one frame and record where the waveform and palette landed in `ts`
pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, samples: &[f32], playhead: f32, ts: &mut TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status
            Constraint::Min(8),    // waveform
            Constraint::Length(8), // tool palette
            Constraint::Length(1), // help
        ])
        .split(area);

    draw_status(frame, sections[0], state);
    ts.wave_area = draw_waveform(frame, sections[1], state, samples, playhead);
    ts.palette = grid::draw_palette(frame, sections[2], state.tool);
    ts.buffer_len = state.buffer_len;
    frame.render_widget(Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)), sections[3]);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let freq = if state.kind == WaveformKind::Custom {
        String::from("--")
    } else {
        format!("{:.1} Hz", state.frequency)
    };
    let transport = match (state.audio_live, state.playing) {
        (false, _) => Span::styled("NO AUDIO", Style::default().fg(Color::Red)),
        (true, true) => Span::styled("PLAY", Style::default().fg(Color::Green)),
        (true, false) => Span::styled("STOP", Style::default().fg(Color::Yellow)),
    };

    let mut spans = vec![
        Span::styled(state.kind.label(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {freq}  ")),
        Span::styled(state.tool.label(), Style::default().fg(Color::LightMagenta)),
        Span::raw(format!(
            "  int {:.2}  smear {:.2}  ",
            state.brush_intensity, state.smear_span
        )),
        transport,
    ];
    if !state.status_text.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(state.status_text.clone(), Style::default().fg(Color::Cyan)));
    }

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(" wavepaint "));
    frame.render_widget(status, area);
}

// Returns the inner area the samples were drawn into
fn draw_waveform(frame: &mut Frame, area: Rect, state: &DisplayState, samples: &[f32], playhead: f32) -> Rect {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    let amp = state.amplitude as f64;
    // braille gives two dots per column
    let bins = (inner.width as usize * 2).max(1);
    let envelope = column_envelope(samples, bins);
    let len = samples.len().max(1) as f64;
    let pending = state.pending_anchor.map(|i| i as f64 / len * bins as f64);
    let head = (state.playing && state.audio_live).then(|| playhead as f64 * bins as f64);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, bins as f64])
        .y_bounds([-amp, amp])
        .paint(move |ctx| {
            ctx.draw(&CanvasLine::new(0.0, 0.0, bins as f64, 0.0, Color::DarkGray));
            if let Some(x) = head {
                ctx.draw(&CanvasLine::new(x, -amp, x, amp, Color::Yellow));
            }
            if let Some(x) = pending {
                ctx.draw(&CanvasLine::new(x, -amp, x, amp, Color::LightMagenta));
            }
            for (x, &(lo, hi)) in envelope.iter().enumerate() {
                let x = x as f64 + 0.5;
                ctx.draw(&CanvasLine::new(x, lo as f64, x, hi as f64, Color::Cyan));
            }
        });
    frame.render_widget(canvas, area);
    inner
}

// min/max of the samples falling into each of `bins` equal slices
fn column_envelope(samples: &[f32], bins: usize) -> Vec<(f32, f32)> {
    if samples.is_empty() || bins == 0 {
        return vec![];
    }
    (0..bins)
        .map(|b| {
            let start = b * samples.len() / bins;
            let end = ((b + 1) * samples.len() / bins).max(start + 1).min(samples.len());
            samples[start.min(samples.len() - 1)..end]
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)))
        })
        .collect()
}
