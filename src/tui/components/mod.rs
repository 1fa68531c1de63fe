//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Every component here is stateless: it is built each frame from props
//! borrowed out of the `Browser` and rendered once. The one piece of
//! presentation state that outlives a frame, the tree scroll offset, belongs
//! to the core `Navigator`, which the renderer feeds the pane height.
//!
//! ### Props-Based Data Flow
//!
//! Components receive external data as props, not by reaching into global
//! state, so each can be rendered alone against a `TestBackend`:
//!
//! ```rust,ignore
//! TitleBar::new(&browser.file_name, browser.is_read_only(), browser.nav.cursor())
//!     .render(frame, title_area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (file name, read-only badge, cursor path)
//! ├── tree_pane.rs     (visible rows)
//! ├── value_pane.rs    (selected value or bucket summary)
//! ├── status_line.rs   (prompt, message or hint)
//! └── help.rs          (key reference overlay)
//! ```

mod help;
mod status_line;
mod title_bar;
mod tree_pane;
mod value_pane;

pub use help::HelpOverlay;
pub use status_line::StatusLine;
pub use title_bar::TitleBar;
pub use tree_pane::TreePane;
pub use value_pane::ValuePane;
