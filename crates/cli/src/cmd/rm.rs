//! Remove mapping rows

use crate::util;
use anyhow::Result;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, path: &str, physical: bool, recursive: bool) -> Result<()> {
    let mapper = util::open_mapper(store)?;
    let removed = mapper.remove_path(path, !physical, recursive)?;
    println!("Removed {removed} row(s)");
    Ok(())
}
