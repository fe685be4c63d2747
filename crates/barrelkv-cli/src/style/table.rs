//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use super::colors::SemanticStyle;

/// Creates a key-value info table (two columns: key and value).
pub fn info_table(entries: &[(&str, &str)]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for (key, value) in entries {
        let key_cell = if super::no_color() {
            Cell::new(key)
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![key_cell, Cell::new(value)]);
    }

    table
}

/// Prints a key-value info table.
pub fn print_info_table(entries: &[(&str, &str)]) {
    let table = info_table(entries);
    println!("{table}");
}

/// Prints a single-column list of keys, one per line, with a trailing count.
pub fn print_key_list(keys: &[String]) {
    if keys.is_empty() {
        println!("{}", "(no keys)".muted());
        return;
    }
    for key in keys {
        println!("{key}");
    }
    let word = if keys.len() == 1 { "key" } else { "keys" };
    println!("{}", format!("({} {word})", keys.len()).muted());
}
