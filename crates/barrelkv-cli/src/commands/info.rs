//! `info` command: print a summary of an open database.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

use crate::style::print_info_table;

pub fn run(dir: &Path) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    let stat = db.stat();

    let dir_display = dir.display().to_string();
    let key_count = stat.key_count.to_string();
    let segment_count = stat.segment_count.to_string();
    let active_file_id = stat.active_file_id.to_string();
    let active_write_off = stat.active_write_off.to_string();

    print_info_table(&[
        ("directory", dir_display.as_str()),
        ("keys", key_count.as_str()),
        ("segments", segment_count.as_str()),
        ("active file id", active_file_id.as_str()),
        ("active write offset", active_write_off.as_str()),
    ]);

    Ok(())
}
