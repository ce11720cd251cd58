//! Time-based coalescing of rapid edits.
//!
//! `Debouncer` is a deadline timer driven by the host's tick loop: every new
//! input replaces the pending deadline, and `poll` fires once after the delay
//! has elapsed without further input. `debounced_channel` provides the same
//! contract for async hosts as a tokio task between two channels.
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start (or restart) the quiet period at `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the pending deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

enum Message<T> {
    Debounced(T),
    Immediate(T),
}

/// Input side of a debounced channel
#[derive(Debug)]
pub struct DebouncedSender<T> {
    tx: UnboundedSender<Message<T>>,
}

impl<T> Clone for DebouncedSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DebouncedSender<T> {
    /// Queue a value; it is emitted once no newer value arrives for the delay.
    /// Returns false when the channel task is gone.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(Message::Debounced(value)).is_ok()
    }

    /// Drop any pending value and emit this one right away
    pub fn send_now(&self, value: T) -> bool {
        self.tx.send(Message::Immediate(value)).is_ok()
    }
}

/// Spawn a coalescing task on the current tokio runtime.
///
/// Dropping every sender cancels a pending value instead of flushing it.
pub fn debounced_channel<T: Send + 'static>(
    delay: Duration,
) -> (DebouncedSender<T>, UnboundedReceiver<T>) {
    let (in_tx, mut in_rx) = mpsc::unbounded_channel::<Message<T>>();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<T>();

    tokio::spawn(async move {
        let mut pending: Option<T> = None;
        loop {
            let message = match pending.take() {
                None => match in_rx.recv().await {
                    Some(message) => message,
                    None => break,
                },
                Some(value) => {
                    tokio::select! {
                        message = in_rx.recv() => match message {
                            Some(message) => message,
                            None => {
                                trace!("debounced channel closed with a pending value");
                                break;
                            }
                        },
                        _ = tokio::time::sleep(delay) => {
                            if out_tx.send(value).is_err() {
                                break;
                            }
                            continue;
                        }
                    }
                }
            };
            match message {
                Message::Debounced(value) => pending = Some(value),
                Message::Immediate(value) => {
                    if out_tx.send(value).is_err() {
                        break;
                    }
                }
            }
        }
    });

    (DebouncedSender { tx: in_tx }, out_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(!debouncer.poll(start));

        debouncer.arm(start);
        assert!(!debouncer.poll(start + Duration::from_millis(499)));
        assert!(debouncer.poll(start + Duration::from_millis(500)));
        assert!(!debouncer.poll(start + Duration::from_millis(900)));
    }

    #[test]
    fn new_input_replaces_pending_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.arm(start);
        debouncer.arm(start + Duration::from_millis(400));
        assert!(!debouncer.poll(start + Duration::from_millis(600)));
        assert!(debouncer.poll(start + Duration::from_millis(900)));
    }

    #[test]
    fn cancel_discards_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.arm(start);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(start + Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn channel_emits_last_value_after_quiet_period() {
        let (tx, mut rx) = debounced_channel(Duration::from_millis(1000));
        tx.send(1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(2);
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(3);

        assert_eq!(rx.recv().await, Some(3));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn send_now_bypasses_pending_value() {
        let (tx, mut rx) = debounced_channel(Duration::from_millis(1000));
        tx.send("typed");
        tx.send_now("cleared");
        assert_eq!(rx.recv().await, Some("cleared"));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(rx.try_recv().is_err());
    }
}
