#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::error::{ArchiveError, Result};
pub use expand::{ExtractedEntry, ZipExpander, ALLOWED_EXTENSIONS};

mod error;
mod expand;
