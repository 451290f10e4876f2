utils::configurable_constants! {
    /// The maximum number of file uploads running concurrently within one
    /// batch session.
    ref MAX_CONCURRENT_FILE_UPLOADS: usize = 10;

    /// Maximum transfer attempts per chunk, the first attempt included,
    /// before the owning file is marked failed.
    ref MAX_CHUNK_TRANSFER_ATTEMPTS: usize = 3;

    /// Delay before the second attempt of a chunk transfer; doubles for each
    /// attempt after that.
    ref CHUNK_RETRY_BASE_DELAY_MS: u64 = 500;
}
