#![cfg_attr(feature = "strict", deny(warnings))]

pub mod configuration_utils;

mod output_bytes;
pub use output_bytes::output_bytes;
