//! # TreePane Component
//!
//! Left pane: the visible rows, one line each, starting at the navigator's
//! scroll offset.
//!
//! ```text
//! ▸ config
//! ▾ users
//!   ▸ admins
//!     alice: alice@example.com
//! ```
//!
//! The row sequence comes from `Browser::current_rows()`; this component only
//! decides how a row looks.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::core::view::{Row, Rows};
use crate::tui::component::Component;

pub struct TreePane<'a> {
    pub rows: Rows<'a>,
    pub scroll: usize,
    pub no_value: bool,
}

impl<'a> TreePane<'a> {
    pub fn new(rows: Rows<'a>, scroll: usize, no_value: bool) -> Self {
        Self {
            rows,
            scroll,
            no_value,
        }
    }
}

/// Text of one row, without styling.
pub fn row_label(row: &Row, no_value: bool) -> String {
    let indent = "  ".repeat(row.depth);
    let marker = match (row.is_bucket, row.expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };
    let key = String::from_utf8_lossy(row.key);
    match row.value {
        Some(value) if !no_value => {
            let value = String::from_utf8_lossy(value);
            let first_line = value.lines().next().unwrap_or_default();
            format!("{indent}{marker}{key}: {first_line}")
        }
        _ => format!("{indent}{marker}{key}"),
    }
}

fn row_style(row: &Row) -> Style {
    let base = if row.is_bucket {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    if row.is_cursor {
        base.add_modifier(Modifier::REVERSED)
    } else {
        base
    }
}

impl Component for TreePane<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray));
        let height = block.inner(area).height as usize;

        let lines: Vec<Line> = self
            .rows
            .clone()
            .skip(self.scroll)
            .take(height)
            .map(|row| {
                Line::from(Span::styled(row_label(&row, self.no_value), row_style(&row)))
            })
            .collect();

        let paragraph = if lines.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "(empty)",
                Style::default().fg(Color::DarkGray),
            )))
        } else {
            Paragraph::new(lines)
        };
        frame.render_widget(paragraph.block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::view::rows;
    use crate::test_support::{p, seeded_browser};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_row_label_shapes() {
        let mut browser = seeded_browser();
        browser.handle_key(crate::core::Action::Enter);
        let labels: Vec<String> = browser
            .current_rows()
            .map(|row| row_label(&row, false))
            .collect();
        assert_eq!(labels, vec!["▾ config", "    theme: dark", "▸ users"]);

        let hidden: Vec<String> = browser
            .current_rows()
            .map(|row| row_label(&row, true))
            .collect();
        assert_eq!(hidden[1], "    theme");
    }

    #[test]
    fn test_tree_pane_skips_scrolled_rows() {
        let browser = seeded_browser();
        let cursor = p(&["users"]);
        let backend = TestBackend::new(30, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                TreePane::new(rows(&browser.tree, &cursor), 1, false).render(f, f.area());
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("users"));
        assert!(!text.contains("config"));
    }
}
