//! # TitleBar Component
//!
//! Top line: program name, file name, a read-only badge, and the cursor path.
//!
//! ```text
//! burrow | app.db [read-only] | users/alice
//! ```
//!
//! Stateless: all three props come from the `Browser` and are re-read every
//! frame.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::store::KeyPath;
use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub file_name: &'a str,
    pub read_only: bool,
    pub cursor: &'a KeyPath,
}

impl<'a> TitleBar<'a> {
    pub fn new(file_name: &'a str, read_only: bool, cursor: &'a KeyPath) -> Self {
        Self {
            file_name,
            read_only,
            cursor,
        }
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let bar = Style::default().bg(Color::Blue).fg(Color::White);
        let mut spans = vec![
            Span::styled(" burrow ", bar.add_modifier(Modifier::BOLD)),
            Span::styled(format!("| {} ", self.file_name), bar),
        ];
        if self.read_only {
            spans.push(Span::styled("[read-only] ", bar.fg(Color::Yellow)));
        }
        if !self.cursor.is_root() {
            spans.push(Span::styled(format!("| {}", self.cursor), bar));
        }
        frame.render_widget(Line::from(spans).style(bar), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::p;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_text(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(60, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_shows_file_and_path() {
        let cursor = p(&["users", "alice"]);
        let text = render_text(&mut TitleBar::new("app.db", false, &cursor));
        assert!(text.contains("burrow"));
        assert!(text.contains("app.db"));
        assert!(text.contains("users/alice"));
        assert!(!text.contains("read-only"));
    }

    #[test]
    fn test_title_bar_read_only_badge() {
        let cursor = KeyPath::root();
        let text = render_text(&mut TitleBar::new("app.db", true, &cursor));
        assert!(text.contains("[read-only]"));
        assert!(!text.contains("| /"));
    }
}
