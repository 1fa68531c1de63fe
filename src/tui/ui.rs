use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::Browser;
use crate::tui::component::Component;
use crate::tui::components::{HelpOverlay, StatusLine, TitleBar, TreePane, ValuePane};

/// ```text
/// ┌──────────────────────────────────────────┐
/// │ title bar                                │
/// ├────────────────────┬─────────────────────┤
/// │ tree pane          │ value pane          │
/// ├────────────────────┴─────────────────────┤
/// │ prompt / message / hint                  │
/// └──────────────────────────────────────────┘
/// ```
pub fn draw_ui(frame: &mut Frame, browser: &mut Browser) {
    use Constraint::{Length, Min, Percentage};
    let [title_area, main_area, status_area] =
        Layout::vertical([Length(1), Min(0), Length(1)]).areas(frame.area());
    let [tree_area, value_area] =
        Layout::horizontal([Percentage(50), Percentage(50)]).areas(main_area);

    // The navigator scrolls against the real pane height.
    browser
        .nav
        .set_viewport(&browser.tree, tree_area.height as usize);

    TitleBar::new(
        &browser.file_name,
        browser.is_read_only(),
        browser.nav.cursor(),
    )
    .render(frame, title_area);

    TreePane::new(
        browser.current_rows(),
        browser.nav.scroll_offset(),
        browser.no_value,
    )
    .render(frame, tree_area);

    ValuePane::new(browser.nav.cursor(), browser.selected()).render(frame, value_area);

    StatusLine::new(
        browser.ui_state(),
        browser.pending_edit(),
        browser.pending_message(),
    )
    .render(frame, status_area);

    if browser.show_help {
        HelpOverlay.render(frame, frame.area());
    }
}
