//! Synchronous event subscription.
//!
//! Handlers run on the caller's thread, in subscription order, during the
//! frame step that emits the event.
//!
//! ```ignore
//! let token = stage.subscribe(ProbeEventKind::Over, |event| {
//!     log::info!("pointer entered at {:?}", event.hit);
//! });
//! stage.unsubscribe(token);
//! ```

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Handlers keyed by event kind.
pub struct EventBus<K, E> {
    next_id: u64,
    handlers: Vec<(Subscription, K, Handler<E>)>,
}

impl<K: PartialEq + Copy, E> EventBus<K, E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, kind: K, handler: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let token = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((token, kind, Box::new(handler)));
        token
    }

    /// Returns `false` if the token was unknown or already removed.
    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _, _)| *t != token);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, kind: K, event: &E) {
        for (_, k, handler) in self.handlers.iter_mut() {
            if *k == kind {
                handler(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<K: PartialEq + Copy, E> Default for EventBus<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> std::fmt::Debug for EventBus<K, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
