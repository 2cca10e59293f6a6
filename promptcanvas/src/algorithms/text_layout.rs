//! Word wrapping for content regions.
//!
//! Widths come from a [`TextMeasure`] supplied by the host (canvas font
//! metrics in the browser, a fixed advance in tests).

use crate::render::TextMeasure;

pub const ELLIPSIS: &str = "\u{2026}";

/// Result of fitting text into a box.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// More lines existed than fit; the last line carries an ellipsis.
    pub truncated: bool,
}

/// Greedy wrap at whitespace. Explicit newlines always break; words wider than
/// the box are split between characters.
pub fn wrap_text(content: &str, max_width: f32, font_size: f32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    if max_width <= 0.0 {
        return lines;
    }
    for paragraph in content.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure.text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // word alone may still overflow
            if measure.text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if measure.text_width(&current, font_size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }
        lines.push(current);
    }
    // a trailing newline should not leave an empty last line
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Keep at most `max_lines`; mark the last kept line with an ellipsis if any
/// were dropped, trimming characters until it fits.
pub fn fit_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> WrappedText {
    if lines.len() <= max_lines {
        return WrappedText { lines, truncated: false };
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut base = last.trim_end().to_string();
        loop {
            let candidate = format!("{base}{ELLIPSIS}");
            if base.is_empty() || measure.text_width(&candidate, font_size) <= max_width {
                *last = candidate;
                break;
            }
            base.pop();
        }
    }
    WrappedText { lines, truncated: true }
}

/// Wrap and fit into a `width` x `height` box at the given line height.
pub fn layout_text_box(
    content: &str,
    width: f32,
    height: f32,
    font_size: f32,
    line_px: f32,
    measure: &dyn TextMeasure,
) -> WrappedText {
    if content.is_empty() || width <= 0.0 || height <= 0.0 || line_px <= 0.0 {
        return WrappedText { lines: Vec::new(), truncated: false };
    }
    let max_lines = (height / line_px).floor() as usize;
    let lines = wrap_text(content, width, font_size, measure);
    fit_lines(lines, max_lines, width, font_size, measure)
}
