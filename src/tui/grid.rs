use crate::shared::Tool;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const COLS: usize = 4;
const ROWS: usize = 4;

// 4x4 tool palette, current tool lit. Returns each cell so clicks can be resolved.
pub fn draw_palette(frame: &mut Frame, area: Rect, current: Tool) -> Vec<(Rect, Tool)> {
    let row_constraints = [Constraint::Ratio(1, ROWS as u32); ROWS];
    let col_constraints = [Constraint::Ratio(1, COLS as u32); COLS];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    let mut cells = Vec::with_capacity(Tool::ALL.len());
    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row_area);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let tool = Tool::ALL[row_idx * COLS + col_idx];
            let lit = tool == current;
            let color = if lit {
                Style::default().fg(Color::LightMagenta).bg(Color::Magenta)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let label = format!("{} [{}]", tool.label(), tool.hotkey());
            let cell = Paragraph::new(label)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::LEFT | Borders::RIGHT).border_style(color))
                .style(color);
            frame.render_widget(cell, *cell_area);
            cells.push((*cell_area, tool));
        }
    }
    cells
}
