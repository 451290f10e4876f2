utils::configurable_constants! {
    /// Fixed size of each transfer chunk. Files are split into chunks of this
    /// many bytes; the final chunk of a file may be shorter.
    ref TRANSFER_CHUNK_SIZE: usize = 5 * 1024 * 1024;
}
