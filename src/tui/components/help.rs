//! # Help Overlay
//!
//! Centered key reference, opened with `?`. Any key closes it.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::tui::component::Component;

const BINDINGS: &[(&str, &str)] = &[
    ("↑/k  ↓/j", "move"),
    ("→/l  ←/h", "expand / collapse"),
    ("Enter", "toggle bucket, edit value"),
    ("g/Home  G/End", "first / last sibling"),
    ("PgUp/^b  PgDn/^f", "page up / down"),
    ("b  B", "new bucket here / one level up"),
    ("p  P", "new pair here / one level up"),
    ("r", "rename"),
    ("e", "edit value"),
    ("D", "delete (confirm with y)"),
    ("x", "export value to file"),
    ("X", "export subtree as JSON"),
    ("R", "reload from disk"),
    ("q", "close this file"),
    ("^c", "quit"),
];

pub struct HelpOverlay;

impl Component for HelpOverlay {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(60, 70, area);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Keys ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" any key to close ").centered())
            .padding(Padding::horizontal(1));

        let key_width = BINDINGS.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        let lines: Vec<Line> = BINDINGS
            .iter()
            .map(|(keys, what)| {
                Line::from(vec![
                    Span::styled(
                        format!("{keys:<key_width$}  "),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*what),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
