//! List mapping rows

use crate::util;
use anyhow::Result;
use filemap_core::in_subtree;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, prefix: Option<&str>) -> Result<()> {
    let mapper = util::open_mapper(store)?;
    let mut rows = mapper.index().entries()?;
    rows.sort_by(|a, b| a.logical.cmp(&b.logical));

    let total = rows.len();
    let mut shown = 0usize;
    for row in rows {
        if let Some(prefix) = prefix {
            if !in_subtree(&row.logical, prefix) {
                continue;
            }
        }
        println!("{} {} {}", row.logical, "->".dimmed(), row.physical);
        shown += 1;
    }

    println!();
    println!("{shown} of {total} row(s)");
    Ok(())
}
