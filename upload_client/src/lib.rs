#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::error::{Result, UploadClientError};
pub use client_testing_utils::{FailureInjectionClient, InjectedFailure};
pub use interface::{Client, FileId, FileRegistration};
pub use local_client::LocalClient;
pub use retry_utils::{
    retry_wrapper, DefaultRetryableStrategy, Retryable, RetryableStrategy, RetryConfig, UniformRetryableStrategy,
};

mod client_testing_utils;
mod error;
mod interface;
mod local_client;
mod retry_utils;
