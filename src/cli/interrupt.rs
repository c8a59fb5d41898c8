//! Interrupt handling for long-running commands
//!
//! The first interrupt cancels the run so the partial result can still be
//! reported. A second one means the user does not want to wait for that.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Exit code for a run aborted by a second interrupt
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancel `cancel` on the first signal from `next_signal`
///
/// Returns `true` once a second signal arrives. Returns `false` if the
/// signal source fails, in which case no further interrupts are observed.
pub async fn watch_interrupts<F, Fut>(mut next_signal: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        tracing::debug!(error = %e, "Unable to listen for interrupts");
        return false;
    }
    tracing::warn!("Interrupted, stopping installation (press Ctrl-C again to exit now)");
    cancel.cancel();

    match next_signal().await {
        Ok(()) => {
            tracing::warn!("Interrupted again, exiting");
            true
        }
        Err(e) => {
            tracing::debug!(error = %e, "Unable to listen for interrupts");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::pin::Pin;
    use tokio::sync::Notify;

    type Signal = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

    /// Signal source fired by `notify_one`
    fn signals(notify: &Arc<Notify>) -> impl FnMut() -> Signal + Send + 'static {
        let notify = notify.clone();
        move || {
            let notify = notify.clone();
            Box::pin(async move {
                notify.notified().await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_exits() {
        let notify = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn(watch_interrupts(signals(&notify), cancel.clone()));

        notify.notify_one();
        cancel.cancelled().await;
        assert!(!watcher.is_finished());

        notify.notify_one();
        assert!(watcher.await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_signal_source_leaves_run_alone() {
        let cancel = CancellationToken::new();
        let exit = watch_interrupts(
            || async { Err(std::io::Error::other("no signal handler")) },
            cancel.clone(),
        )
        .await;

        assert!(!exit);
        assert!(!cancel.is_cancelled());
    }
}
