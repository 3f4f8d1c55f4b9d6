//! Duplicate or rename a subtree's mappings
//!
//! `fmap cp` duplicates rows, keeping the source; `fmap mv` rewrites them
//! in place and drops the source's own row.

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, src: &str, dst: &str, rename: bool) -> Result<()> {
    let mapper = util::open_mapper(store)?;
    let rows = if rename {
        mapper.move_subtree(src, dst)?
    } else {
        mapper.copy_subtree(src, dst)?
    };

    let verb = if rename { "Moved" } else { "Copied" };
    println!("{verb} {rows} nested row(s): {src} {} {dst}", "->".dimmed());
    Ok(())
}
