use anyhow::Result;

/// The daemon intentionally runs on a current-thread runtime: input events,
/// debounce timers and periodic ticks are all dispatched serially, so the
/// counters need no locking.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
