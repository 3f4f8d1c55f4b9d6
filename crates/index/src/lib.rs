//! Durable logical <-> physical path mapping
//!
//! This crate provides:
//! - Bincode-encoded mapping rows (`MappingEntry`)
//! - A sled-backed bidirectional hash index (`PathIndex`)
//! - Resolution and subtree rename orchestration on top of it (`Mapper`)

pub mod entry;
pub mod error;
pub mod index;
pub mod mapper;

// Re-exports
pub use entry::MappingEntry;
pub use error::{IndexError, Result};
pub use index::{PathIndex, Scope};
pub use mapper::{Mapper, MapperConfig, MissingPath};
