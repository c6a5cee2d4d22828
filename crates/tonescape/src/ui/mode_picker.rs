//! Mode picker overlay.
//!
//! Lists the visualization modes, marks the live one and lets the user pick
//! another with the arrow keys.

use nannou::prelude::*;
use tonescape_engine::ModeKind;

/// Entry representing a mode in the picker
#[derive(Clone, Debug)]
pub struct ModeEntry {
    pub mode: ModeKind,
    /// Whether this mode is currently live
    pub active: bool,
}

/// Manages mode picker state
pub struct ModePicker {
    pub active: bool,
    pub entries: Vec<ModeEntry>,
    pub selected_idx: usize,
}

impl ModePicker {
    pub fn new() -> Self {
        let entries = ModeKind::ALL
            .iter()
            .map(|&mode| ModeEntry {
                mode,
                active: false,
            })
            .collect();

        Self {
            active: false,
            entries,
            selected_idx: 0,
        }
    }

    /// Show the picker with the live mode preselected
    pub fn show(&mut self, live: Option<ModeKind>) {
        for entry in &mut self.entries {
            entry.active = Some(entry.mode) == live;
        }
        if let Some(idx) = self.entries.iter().position(|e| e.active) {
            self.selected_idx = idx;
        }
        self.active = true;
    }

    pub fn hide(&mut self) {
        self.active = false;
    }

    /// Move selection up (cycles)
    pub fn move_up(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        if self.selected_idx == 0 {
            self.selected_idx = self.entries.len() - 1;
        } else {
            self.selected_idx -= 1;
        }
    }

    /// Move selection down (cycles)
    pub fn move_down(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected_idx = (self.selected_idx + 1) % self.entries.len();
    }

    pub fn selected_mode(&self) -> Option<ModeKind> {
        self.entries.get(self.selected_idx).map(|e| e.mode)
    }
}

impl Default for ModePicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the mode picker overlay
pub fn draw_mode_picker(draw: &Draw, bounds: Rect, picker: &ModePicker) {
    let padding = 20.0;
    let line_height = 22.0;
    let font_size = 18;

    let overlay_width = 260.0;
    let overlay_height = line_height * (picker.entries.len() as f32 + 3.0) + padding * 2.0;

    // Position at top-right
    let overlay_x = bounds.right() - overlay_width / 2.0 - padding;
    let overlay_y = bounds.top() - overlay_height / 2.0 - padding;

    draw.rect()
        .x_y(overlay_x, overlay_y)
        .w_h(overlay_width, overlay_height)
        .color(rgba(0.0, 0.0, 0.0, 0.85));

    draw.rect()
        .x_y(overlay_x, overlay_y)
        .w_h(overlay_width, overlay_height)
        .stroke(rgba(1.0, 1.0, 1.0, 0.3))
        .stroke_weight(1.0)
        .no_fill();

    let text_left = overlay_x - overlay_width / 2.0 + padding;
    let text_width = overlay_width - padding * 2.0;

    let title_y = overlay_y + overlay_height / 2.0 - padding - line_height / 2.0;
    draw.text("Modes")
        .xy(pt2(overlay_x, title_y))
        .wh(pt2(text_width, line_height))
        .center_justify()
        .color(rgba(0.5, 0.8, 1.0, 0.9))
        .font_size(font_size);

    let sep_y = title_y - line_height * 0.7;
    draw.line()
        .start(pt2(text_left, sep_y))
        .end(pt2(overlay_x + overlay_width / 2.0 - padding, sep_y))
        .color(rgba(1.0, 1.0, 1.0, 0.3))
        .weight(1.0);

    for (i, entry) in picker.entries.iter().enumerate() {
        let item_y = sep_y - line_height * (i as f32 + 1.0);
        let is_selected = i == picker.selected_idx;

        let status = if entry.active { "[*]" } else { "[ ]" };
        let prefix = if is_selected { "> " } else { "  " };
        let text = format!("{}{} {} {}", prefix, status, i + 1, entry.mode.name());

        let color = if is_selected {
            rgb(0.3, 0.8, 1.0)
        } else if entry.active {
            rgb(0.6, 1.0, 0.6)
        } else {
            rgb(1.0, 1.0, 1.0)
        };

        draw.text(&text)
            .xy(pt2(text_left + text_width / 2.0, item_y))
            .wh(pt2(text_width, line_height))
            .left_justify()
            .no_line_wrap()
            .color(color)
            .font_size(font_size);
    }

    let help_y = sep_y - line_height * (picker.entries.len() as f32 + 1.5);
    draw.text("Enter: select | Esc: close")
        .xy(pt2(overlay_x, help_y))
        .wh(pt2(text_width, line_height))
        .center_justify()
        .color(rgba(1.0, 1.0, 1.0, 0.5))
        .font_size(14);
}
