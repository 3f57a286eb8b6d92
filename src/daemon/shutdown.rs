use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. This works with limmited success.
///
/// On Windows detached processes can't detect signals sent to them, so this should be enhanced in the future to
/// support another way of sending signals.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                tracing::error!("Failed to install the SIGTERM handler {e:?}");
                cancelation.cancelled().await;
                return;
            }
        };
        select! {
            _ = tokio::signal::ctrl_c() => cancelation.cancel(),
            _ = terminate.recv() => cancelation.cancel(),
        };
    }
    #[cfg(not(unix))]
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
