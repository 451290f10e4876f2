#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constants;
pub mod errors;

mod intake;
mod session;
mod source;

pub use intake::{expand_selection, SkippedArchive};
pub use session::{BatchSummary, BatchUploadConfig, BatchUploadSession};
pub use source::UploadSource;
