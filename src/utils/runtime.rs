use anyhow::Result;

/// Every operation runs on this single thread, the store calls only yield while waiting on the
/// network.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
