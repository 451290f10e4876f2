#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constants;

mod ranges;
pub use ranges::{chunk_ranges, ChunkRange};
