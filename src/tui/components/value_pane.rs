//! # ValuePane Component
//!
//! Right pane: details for the node under the cursor. A pair shows its value,
//! wrapped to the pane width when it is UTF-8 and as a hex dump otherwise. A
//! bucket shows a short summary.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::core::tree::Node;
use crate::store::KeyPath;
use crate::tui::component::Component;

const HEX_BYTES_PER_LINE: usize = 16;

pub struct ValuePane<'a> {
    pub path: &'a KeyPath,
    pub node: Option<&'a Node>,
}

impl<'a> ValuePane<'a> {
    pub fn new(path: &'a KeyPath, node: Option<&'a Node>) -> Self {
        Self { path, node }
    }
}

/// `offset  hex bytes  ascii`, 16 bytes per line.
pub fn hex_dump(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(HEX_BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:08x}  {:<width$}  {}",
                i * HEX_BYTES_PER_LINE,
                hex.join(" "),
                ascii,
                width = HEX_BYTES_PER_LINE * 3 - 1
            )
        })
        .collect()
}

/// Lines to show for `node` at the given content width.
pub fn value_lines(path: &KeyPath, node: &Node, width: usize) -> Vec<String> {
    if node.is_bucket() {
        let summary = match &node.children {
            Some(children) => {
                let buckets = children.iter().filter(|c| c.is_bucket()).count();
                format!(
                    "{} entries ({} buckets, {} pairs)",
                    children.len(),
                    buckets,
                    children.len() - buckets
                )
            }
            None => "children not loaded yet".to_string(),
        };
        return vec![format!("Bucket {path}"), summary];
    }

    let value = node.value.as_deref().unwrap_or_default();
    let mut lines = vec![format!("Pair {path} ({} bytes)", value.len()), String::new()];
    match std::str::from_utf8(value) {
        Ok(text) => {
            let width = width.max(1);
            for line in text.lines() {
                let options = textwrap::Options::new(width).break_words(true);
                lines.extend(textwrap::wrap(line, options).into_iter().map(|l| l.into_owned()));
            }
        }
        Err(_) => lines.extend(hex_dump(value)),
    }
    lines
}

impl Component for ValuePane<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().padding(Padding::horizontal(1));
        let width = block.inner(area).width as usize;
        let lines: Vec<Line> = match self.node {
            Some(node) => value_lines(self.path, node, width)
                .into_iter()
                .map(Line::from)
                .collect(),
            None => vec![Line::styled(
                "Nothing selected",
                Style::default().fg(Color::DarkGray),
            )],
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
