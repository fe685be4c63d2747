//! `get` command: read a single key.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

pub fn run(dir: &Path, key: &str) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    let value = db.get(key.as_bytes()).with_context(|| format!("reading key {key:?}"))?;
    println!("{}", String::from_utf8_lossy(&value));
    Ok(())
}
