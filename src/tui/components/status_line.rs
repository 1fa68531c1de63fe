//! # StatusLine Component
//!
//! Bottom line. Shows, in priority order: the input prompt of a pending edit
//! (with the terminal cursor at the end of the buffer), the transient status
//! message, or a key hint.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::action::UiState;
use crate::core::edit::PendingEdit;
use crate::tui::component::Component;

const HINT: &str = "?: help  q: quit  b/p: new bucket/pair  r: rename  e: edit  D: delete";

pub struct StatusLine<'a> {
    pub ui_state: UiState,
    pub pending: Option<&'a PendingEdit>,
    pub message: Option<&'a str>,
}

impl<'a> StatusLine<'a> {
    pub fn new(
        ui_state: UiState,
        pending: Option<&'a PendingEdit>,
        message: Option<&'a str>,
    ) -> Self {
        Self {
            ui_state,
            pending,
            message,
        }
    }

    /// Prompt text and the input buffer, if an edit is collecting input.
    pub fn prompt(&self) -> Option<(String, &'a str)> {
        let pending = self.pending?;
        match self.ui_state {
            UiState::EditingKey => Some((
                format!("{} {}: ", pending.describe(), field("key", pending.key_hex)),
                pending.key.as_str(),
            )),
            UiState::EditingValue => Some((
                format!("{} {}: ", pending.describe(), field("value", pending.value_hex)),
                pending.value.as_str(),
            )),
            UiState::ConfirmingDelete => Some((format!("{} (y/N) ", pending.describe()), "")),
            UiState::Browsing => None,
        }
    }
}

fn field(name: &str, hex: bool) -> String {
    if hex {
        format!("{name} (hex)")
    } else {
        name.to_string()
    }
}

impl Component for StatusLine<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let message_style = Style::default().fg(Color::Yellow);
        let Some((prompt, buffer)) = self.prompt() else {
            let line = match self.message {
                Some(message) => Line::from(Span::styled(message, message_style)),
                None => Line::from(Span::styled(HINT, Style::default().fg(Color::DarkGray))),
            };
            frame.render_widget(line, area);
            return;
        };

        let mut spans = Vec::new();
        let mut before_cursor = String::new();
        if let Some(message) = self.message {
            let text = format!("{message} | ");
            before_cursor.push_str(&text);
            spans.push(Span::styled(text, message_style));
        }
        before_cursor.push_str(&prompt);
        before_cursor.push_str(buffer);
        spans.push(Span::styled(prompt, Style::default().fg(Color::Cyan)));
        spans.push(Span::raw(buffer));
        frame.render_widget(Line::from(spans), area);

        if self.ui_state != UiState::ConfirmingDelete {
            let offset = (before_cursor.width() as u16).min(area.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(area.x + offset, area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::NodeKind;
    use crate::store::KeyPath;
    use crate::test_support::p;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(status: &mut StatusLine) -> (String, Position) {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                status.render(f, f.area());
            })
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        let cursor = terminal.get_cursor_position().unwrap();
        (text, cursor)
    }

    #[test]
    fn test_hint_when_idle() {
        let (text, _) = render(&mut StatusLine::new(UiState::Browsing, None, None));
        assert!(text.contains("?: help"));
    }

    #[test]
    fn test_message_replaces_hint() {
        let (text, _) = render(&mut StatusLine::new(
            UiState::Browsing,
            None,
            Some("Reloaded"),
        ));
        assert!(text.contains("Reloaded"));
        assert!(!text.contains("?: help"));
    }

    #[test]
    fn test_prompt_places_cursor_after_buffer() {
        let mut pending = PendingEdit::create(KeyPath::root(), NodeKind::Bucket);
        pending.key = "logs".to_string();
        let (text, cursor) = render(&mut StatusLine::new(
            UiState::EditingKey,
            Some(&pending),
            None,
        ));
        let expected = "New bucket in / key: logs";
        assert!(text.starts_with(expected));
        assert_eq!(cursor, Position::new(expected.len() as u16, 0));
    }

    #[test]
    fn test_binary_value_prompt_is_marked_hex() {
        let pending = PendingEdit::edit_value(p(&["blob"]), &[0xff, 0x00]);
        let (text, _) = render(&mut StatusLine::new(
            UiState::EditingValue,
            Some(&pending),
            None,
        ));
        assert!(text.contains("Edit value of blob value (hex): ff00"));
    }

    #[test]
    fn test_delete_confirmation_prompt() {
        let pending = PendingEdit::delete(p(&["users"]));
        let (text, _) = render(&mut StatusLine::new(
            UiState::ConfirmingDelete,
            Some(&pending),
            None,
        ));
        assert!(text.contains("Delete users? (y/N)"));
    }
}
