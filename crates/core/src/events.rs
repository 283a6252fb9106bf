//! A minimal publish/subscribe channel for notifying the presentation layer
//! (or anyone else) about state changes.

use std::fmt;

/// Handle returned from [EventBus::subscribe], used to unsubscribe later
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered list of subscribers for one kind of event. Every published
/// event is handed to each subscriber in the order they subscribed, so all
/// subscribers observe the same sequence of events.
///
/// Everything runs on a single thread, inside whatever call triggered the
/// event. Subscribers can't mutate the state that emitted the event (they
/// only get a shared reference to the event itself), so if a subscriber
/// wants to react with a command, it should queue that up and issue it after
/// the current call returns.
pub struct EventBus<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Register a callback that will receive every subsequent event
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&E) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let len_before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != len_before
    }

    /// Hand an event to every subscriber
    pub fn publish(&mut self, event: &E) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
