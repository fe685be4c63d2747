//! `delete` command: remove a single key.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

use crate::style::{SemanticStyle, print_success};

pub fn run(dir: &Path, key: &str) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    db.delete(key.as_bytes()).with_context(|| format!("deleting key {key:?}"))?;
    print_success(&format!("deleted {}", key.code()));
    Ok(())
}
