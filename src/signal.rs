//! Change notification for the "awake" state.
//!
//! [`StateSignal`] pushes every published value to two kinds of observers:
//!
//! - listeners: callbacks run synchronously on the publishing thread,
//! - subscribers: [`crossbeam_channel`] receivers, for front-ends that poll or
//!   `select!` on state changes from another thread.
//!
//! Listeners run inside the manager's critical section. They may read state
//! (`is_active()` is lock-free) but must not call back into `enable()`,
//! `disable()` or `toggle()`. The current value itself lives in the manager's
//! atomic, not here.

use crossbeam_channel::{Receiver, Sender};

type Listener = Box<dyn Fn(bool) + Send + Sync>;

/// Identifies a registered listener so it can be removed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out of boolean state changes.
#[derive(Default)]
pub struct StateSignal {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
    subscribers: Vec<Sender<bool>>,
}

impl StateSignal {
    /// Create a signal with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with every published value.
    pub fn listen(&mut self, listener: impl Fn(bool) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Open a channel that receives every published value.
    ///
    /// Dropping the receiver unsubscribes; the sender is pruned on the next
    /// publish.
    pub fn subscribe(&mut self) -> Receiver<bool> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Notify every observer of `value` once.
    pub fn publish(&mut self, value: bool) {
        for (_, listener) in &self.listeners {
            listener(value);
        }
        self.subscribers.retain(|tx| tx.send(value).is_ok());
    }

}

impl std::fmt::Debug for StateSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSignal")
            .field("listeners", &self.listeners.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
