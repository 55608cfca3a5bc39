use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Fired when the feedback pause after `item_index` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceSignal {
    pub item_index: usize,
}

/// Cancellable one-shot timer for the pause between items.
///
/// Must be used inside a tokio runtime. Dropping the timer cancels any
/// pending signal.
#[derive(Debug)]
pub struct PauseTimer {
    tx: UnboundedSender<AdvanceSignal>,
    pending: Option<JoinHandle<()>>,
}

impl PauseTimer {
    pub fn new() -> (Self, UnboundedReceiver<AdvanceSignal>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx, pending: None }, rx)
    }

    /// Replaces any pending signal.
    pub fn schedule(&mut self, item_index: usize, delay: Duration) {
        self.cancel();
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(AdvanceSignal { item_index }).is_err() {
                debug!(item_index, "Advance signal dropped, receiver closed");
            }
        }));
        debug!(item_index, delay_ms = delay.as_millis() as u64, "Scheduled advance");
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PauseTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fires_after_delay() {
        let (mut timer, mut rx) = PauseTimer::new();
        timer.schedule(4, Duration::from_millis(10));
        assert!(timer.is_pending());
        let signal = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signal, AdvanceSignal { item_index: 4 });
    }

    #[tokio::test]
    async fn cancel_suppresses_signal() {
        let (mut timer, mut rx) = PauseTimer::new();
        timer.schedule(0, Duration::from_millis(20));
        timer.cancel();
        assert!(!timer.is_pending());
        let res = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn closed_receiver_does_not_fail_the_task() {
        let (mut timer, rx) = PauseTimer::new();
        drop(rx);
        timer.schedule(3, Duration::from_millis(5));
        let handle = timer.pending.take().unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(!timer.is_pending());
    }

    #[tokio::test]
    async fn reschedule_replaces_pending() {
        let (mut timer, mut rx) = PauseTimer::new();
        timer.schedule(1, Duration::from_millis(30));
        timer.schedule(2, Duration::from_millis(10));
        let signal = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signal.item_index, 2);
        let res = tokio::time::timeout(Duration::from_millis(80), rx.recv()).await;
        assert!(res.is_err());
    }
}
