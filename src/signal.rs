use core::sync::atomic::{AtomicUsize, Ordering};

use alloc::{boxed::Box, vec::Vec};

// A synchronous, single-argument notification with any number of observers.
// Observers run in connection order, on the emitter's call stack. They must
//  not call back into whatever emitted the signal.
pub struct Signal<T> {
    slots: Vec<(Connection, Box<dyn FnMut(&T)>)>,
}

// Unique across all signals, so it stays valid when observers are moved
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Connection(usize);

impl Connection {
    fn next() -> Self {
        static NEXT_CONNECTION: AtomicUsize = AtomicUsize::new(1);
        Connection(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn connect<F>(&mut self, observer: F) -> Connection
    where
        F: FnMut(&T) + 'static,
    {
        let connection = Connection::next();
        self.slots.push((connection, Box::new(observer)));
        connection
    }

    // Moves every observer of `other` to the end of this signal
    pub(crate) fn take_observers(&mut self, other: &mut Signal<T>) {
        self.slots.append(&mut other.slots);
    }

    // Returns whether the connection was still active
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(c, _)| *c != connection);
        self.slots.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn emit(&mut self, value: &T) {
        for (_, observer) in self.slots.iter_mut() {
            observer(value);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, vec::Vec};
    use core::cell::RefCell;

    use super::Signal;

    #[test]
    fn test_connect_emit_disconnect() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let first = {
            let seen = seen.clone();
            signal.connect(move |v| seen.borrow_mut().push((1, *v)))
        };
        {
            let seen = seen.clone();
            signal.connect(move |v| seen.borrow_mut().push((2, *v)));
        }
        assert_eq!(signal.observer_count(), 2);

        signal.emit(&10);
        assert!(signal.disconnect(first));
        assert!(!signal.disconnect(first));
        signal.emit(&20);

        assert_eq!(*seen.borrow(), [(1, 10), (2, 10), (2, 20)]);
    }

    #[test]
    fn test_take_observers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut old = Signal::<u32>::new();
        let mut new = Signal::<u32>::new();

        let moved = {
            let seen = seen.clone();
            old.connect(move |v| seen.borrow_mut().push(*v))
        };
        new.connect(|_| {});
        new.take_observers(&mut old);
        assert_eq!(old.observer_count(), 0);
        assert_eq!(new.observer_count(), 2);

        new.emit(&7);
        assert_eq!(*seen.borrow(), [7]);
        assert!(new.disconnect(moved));
        assert_eq!(new.observer_count(), 1);
    }
}
