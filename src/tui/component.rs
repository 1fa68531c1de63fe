use ratatui::Frame;
use ratatui::layout::Rect;

/// A reusable UI component.
///
/// Components receive data via props (struct fields) and render to a `Frame`
/// within a given `Rect`. Panes are built fresh each frame from borrowed
/// `Browser` state, so they hold no state of their own.
///
/// `render` takes `&mut self` so a component can cache layout results
/// during the render pass, matching Ratatui's `StatefulWidget` pattern.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}
