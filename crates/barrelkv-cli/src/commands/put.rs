//! `put` command: write a single key-value pair.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

use crate::style::{SemanticStyle, print_success};

pub fn run(dir: &Path, key: &str, value: &str) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    db.put(key.as_bytes(), value.as_bytes())
        .with_context(|| format!("writing key {key:?}"))?;
    print_success(&format!("put {} -> {}", key.code(), value));
    Ok(())
}
