use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn(Option<&str>)>;

#[derive(Default)]
struct Inner {
    current: Option<String>,
    version: u64,
    next_listener_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Create the active-region cell, returning its only writer and a reader.
///
/// The writer is not `Clone`; the intersection tracker is its only owner.
/// Readers can be cloned freely and subscribe to changes.
pub fn active_region_cell() -> (ActiveRegionWriter, ActiveRegion) {
    let inner = Rc::new(RefCell::new(Inner::default()));
    (
        ActiveRegionWriter {
            inner: inner.clone(),
        },
        ActiveRegion { inner },
    )
}

/// Write half of the active-region cell.
pub struct ActiveRegionWriter {
    inner: Rc<RefCell<Inner>>,
}

impl ActiveRegionWriter {
    /// Make `id` the active region. Last write wins.
    ///
    /// Returns `false` (and notifies nobody) when `id` is already active.
    /// Listeners run synchronously, after the new value is visible to readers.
    pub fn set(&self, id: &str) -> bool {
        let listeners: Vec<Listener> = {
            let mut inner = self.inner.borrow_mut();
            if inner.current.as_deref() == Some(id) {
                return false;
            }
            inner.current = Some(id.to_string());
            inner.version += 1;
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };

        for listener in listeners {
            listener(Some(id));
        }
        true
    }

    pub fn reader(&self) -> ActiveRegion {
        ActiveRegion {
            inner: self.inner.clone(),
        }
    }
}

/// Read half of the active-region cell.
#[derive(Clone)]
pub struct ActiveRegion {
    inner: Rc<RefCell<Inner>>,
}

impl ActiveRegion {
    pub fn get(&self) -> Option<String> {
        self.inner.borrow().current.clone()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.inner.borrow().current.as_deref() == Some(id)
    }

    /// Number of effective writes so far.
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a change listener. It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, listener: impl Fn(Option<&str>) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Subscription {
            cell: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Unregisters its listener on drop.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cell: Weak<RefCell<Inner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.upgrade()
            && let Ok(mut inner) = cell.try_borrow_mut()
        {
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn last_write_wins() {
        let (writer, reader) = active_region_cell();
        assert_eq!(reader.get(), None);
        assert!(writer.set("sp-a"));
        assert!(writer.set("sp-b"));
        assert_eq!(reader.get().as_deref(), Some("sp-b"));
        assert!(reader.is_active("sp-b"));
        assert_eq!(reader.version(), 2);
    }

    #[test]
    fn repeated_write_does_not_notify() {
        let (writer, reader) = active_region_cell();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _sub = reader.subscribe(move |_| counter.set(counter.get() + 1));

        writer.set("sp-a");
        assert!(!writer.set("sp-a"));
        assert_eq!(calls.get(), 1);
        assert_eq!(reader.version(), 1);
    }

    #[test]
    fn listeners_see_the_new_value() {
        let (writer, reader) = active_region_cell();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in = seen.clone();
        let reader_in = reader.clone();
        let _sub = reader.subscribe(move |id| {
            assert_eq!(reader_in.get().as_deref(), id);
            seen_in.borrow_mut().push(id.map(str::to_string));
        });

        writer.set("sp-a");
        writer.set("sp-b");
        assert_eq!(
            *seen.borrow(),
            vec![Some("sp-a".to_string()), Some("sp-b".to_string())]
        );
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let (writer, reader) = active_region_cell();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let sub = reader.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(reader.listener_count(), 1);

        writer.set("sp-a");
        drop(sub);
        writer.set("sp-b");
        assert_eq!(calls.get(), 1);
        assert_eq!(reader.listener_count(), 0);
    }
}
