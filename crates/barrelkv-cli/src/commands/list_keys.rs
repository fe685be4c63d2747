//! `list-keys` command: print every live key.

use std::path::Path;

use anyhow::{Context, Result};
use barrelkv::{Engine, Options};

use crate::style::print_key_list;

pub fn run(dir: &Path) -> Result<()> {
    let db = Engine::open(Options::new(dir)).with_context(|| format!("opening {}", dir.display()))?;
    let keys: Vec<String> = db
        .list_keys()
        .into_iter()
        .map(|k| String::from_utf8_lossy(&k).into_owned())
        .collect();
    print_key_list(&keys);
    Ok(())
}
