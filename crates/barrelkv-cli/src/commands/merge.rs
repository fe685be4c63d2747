//! `merge` command: compact segments, reclaiming space held by stale and deleted keys.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

use crate::style::print_success;

pub fn run(dir: &Path) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    db.merge().context("merging segments")?;
    print_success("merge complete");
    Ok(())
}
