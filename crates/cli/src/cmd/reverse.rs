//! Resolve a physical path back to its logical name
//!
//! A physical path never seen before is registered as self-mapped, the
//! same way externally dropped content is picked up.

use crate::util;
use anyhow::Result;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, path: &str) -> Result<()> {
    let mapper = util::open_mapper(store)?;
    let logical = mapper.physical_to_logic(path)?;
    println!("{logical}");
    Ok(())
}
