//! Coalescing debounce timer.
//!
//! A background task collects events until a quiet window elapses, then
//! hands the collected batch to the handler. Events sharing a key coalesce:
//! only the last one per key within a window survives. Disposing (or
//! dropping) the debouncer cancels the task, so a pending window never
//! fires after teardown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

pub struct Debouncer<T> {
    sender: mpsc::Sender<T>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<K, KeyFn, Handler, Fut>(quiet: Duration, key_of: KeyFn, mut handler: Handler) -> Self
    where
        K: PartialEq + Send,
        KeyFn: Fn(&T) -> K + Send + 'static,
        Handler: FnMut(Vec<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (sender, mut receiver) = mpsc::channel::<T>(32);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut pending: Vec<T> = Vec::new();
            loop {
                tokio::select! {
                    maybe = receiver.recv() => match maybe {
                        Some(event) => {
                            let key = key_of(&event);
                            match pending.iter_mut().find(|held| key_of(held) == key) {
                                Some(held) => *held = event,
                                None => pending.push(event),
                            }
                        }
                        None => break,
                    },
                    () = tokio::time::sleep(quiet), if !pending.is_empty() => {
                        let batch = std::mem::take(&mut pending);
                        handler(batch).await;
                    },
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            sender,
            shutdown: Mutex::new(Some(shutdown_tx)),
        }
    }

    /// Enqueue an event for the current window. A no-op once disposed.
    pub fn call(&self, event: T) {
        if self.sender.try_send(event).is_err() {
            debug!("debouncer is gone or saturated; dropping event");
        }
    }

    /// Cancel the background task. Pending events are discarded, not run.
    pub fn dispose(&self) {
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                tx.send(()).ok();
            }
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                tx.send(()).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    type Batches = Arc<Mutex<Vec<Vec<(u8, String)>>>>;

    fn spy() -> (Batches, impl FnMut(Vec<(u8, String)>) -> std::future::Ready<()>) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&batches);
        let handler = move |batch: Vec<(u8, String)>| {
            sink.lock().unwrap().push(batch);
            std::future::ready(())
        };
        (batches, handler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_last_event() {
        let (batches, handler) = spy();
        let debouncer = Debouncer::new(Duration::from_millis(100), |e: &(u8, String)| e.0, handler);

        for n in 1..=5 {
            debouncer.call((0, format!("edit {n}")));
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![(0, "edit 5".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_survive_the_window() {
        let (batches, handler) = spy();
        let debouncer = Debouncer::new(Duration::from_millis(100), |e: &(u8, String)| e.0, handler);

        debouncer.call((0, "markup".to_string()));
        debouncer.call((1, "script".to_string()));
        debouncer.call((0, "markup again".to_string()));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![
                (0, "markup again".to_string()),
                (1, "script".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_window() {
        let (batches, handler) = spy();
        let debouncer = Debouncer::new(Duration::from_millis(100), |e: &(u8, String)| e.0, handler);

        debouncer.call((0, "never rendered".to_string()));
        debouncer.dispose();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(batches.lock().unwrap().is_empty());
        // Late calls after dispose are quietly dropped.
        debouncer.call((0, "too late".to_string()));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(batches.lock().unwrap().is_empty());
    }
}
