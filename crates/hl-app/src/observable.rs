//! Observable value holders.
//!
//! Every piece of consumer-visible state is owned by one `Observable`. Readers
//! either take the latest value or subscribe and get woken on change; nobody
//! polls.

use tokio::sync::watch;

#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq,
{
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Stores `value` and notifies subscribers if it differs from the current one.
    /// Returns whether subscribers were notified.
    pub fn publish(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Stores `value` and notifies subscribers unconditionally.
    pub fn emit(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutates in place; `f` reports whether anything changed.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
