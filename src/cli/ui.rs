use crate::core::LegView;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Converted amount of a leg, dimmed while the figure is still loading.
pub fn amount_cell(leg: &LegView) -> Cell {
    let cell = Cell::new(&leg.converted_amount).set_alignment(CellAlignment::Right);
    if leg.error.is_some() {
        cell.fg(Color::Red)
    } else if leg.is_fetching {
        cell.fg(Color::DarkGrey)
    } else {
        cell.fg(Color::Green).add_attribute(Attribute::Bold)
    }
}

/// Loading / error indicator for a leg.
pub fn status_cell(leg: &LegView) -> Cell {
    match (&leg.error, leg.is_pending, leg.is_fetching) {
        (Some(error), _, _) => Cell::new(error).fg(Color::Red),
        (None, true, _) => Cell::new("loading…").fg(Color::Yellow),
        (None, false, true) => Cell::new("refreshing…").fg(Color::DarkGrey),
        (None, false, false) => Cell::new("").fg(Color::DarkGrey),
    }
}

/// Creates a spinner shown while quotes are being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
