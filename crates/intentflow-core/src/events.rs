//! Ordered, synchronous event delivery.

use intentflow_models::ExecutionEvent;
use intentflow_traits::ExecutionListener;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::warn;

const BUFFER_CAPACITY: usize = 256;

/// Dispatches execution events to registered listeners and channel subscribers.
///
/// Listeners run synchronously on the emitting task, in registration order,
/// before `emit` returns. A listener that errors or panics is logged and
/// skipped; the remaining listeners still receive the event.
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn ExecutionListener>>>,
    sender: broadcast::Sender<ExecutionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(BUFFER_CAPACITY);
        Self {
            listeners: RwLock::new(Vec::new()),
            sender,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ExecutionListener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Subscribe to a channel copy of every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let listeners: Vec<Arc<dyn ExecutionListener>> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(event = event.name(), error = %err, "Execution listener failed");
                }
                Err(_) => {
                    warn!(event = event.name(), "Execution listener panicked");
                }
            }
        }

        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn fallback_done(step_index: usize) -> ExecutionEvent {
        ExecutionEvent::FallbackCompleted {
            step_index,
            success: true,
        }
    }

    #[test]
    fn listeners_receive_events_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.add_listener(Arc::new(move |event: &ExecutionEvent| -> anyhow::Result<()> {
            if let ExecutionEvent::FallbackCompleted { step_index, .. } = event {
                sink.lock().unwrap().push(*step_index);
            }
            Ok(())
        }));

        for index in 0..5 {
            bus.emit(fallback_done(index));
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn failing_listeners_do_not_block_others() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0usize));

        bus.add_listener(Arc::new(|_: &ExecutionEvent| -> anyhow::Result<()> {
            anyhow::bail!("listener error")
        }));
        bus.add_listener(Arc::new(|_: &ExecutionEvent| -> anyhow::Result<()> {
            panic!("listener panic")
        }));
        let counter = count.clone();
        bus.add_listener(Arc::new(move |_: &ExecutionEvent| -> anyhow::Result<()> {
            *counter.lock().unwrap() += 1;
            Ok(())
        }));

        bus.emit(fallback_done(0));
        bus.emit(fallback_done(1));

        assert_eq!(bus.listener_count(), 3);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn subscribers_get_channel_copies() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(fallback_done(7));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received, fallback_done(7));
    }
}
