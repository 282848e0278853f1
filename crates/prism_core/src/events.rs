use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Typed fan-out channel: every emitted event is delivered to each live
/// subscriber, in subscription order, without blocking the emitter.
pub struct EventChannel<T> {
    subscribers: Vec<UnboundedSender<T>>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> EventChannel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<T> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Sends `event` to every subscriber. Subscribers whose receiver was
    /// dropped are forgotten. Returns how many subscribers got the event.
    pub fn emit(&mut self, event: &T) -> usize {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
