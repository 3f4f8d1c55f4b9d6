//! Resolve a logical path to its physical name
//!
//! Usage:
//!   fmap resolve /logical/path            # dry run, nothing stored
//!   fmap resolve /logical/path --create   # persist the assignment

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, path: &str, create: bool) -> Result<()> {
    let mapper = util::open_mapper(store)?;
    let physical = mapper.logic_to_physical(path, create)?;

    if create {
        println!("{physical}");
    } else {
        println!("{physical} {}", "(dry run, not stored)".dimmed());
    }
    Ok(())
}
