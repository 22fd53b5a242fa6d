use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Scoped registration with a stream source, released exactly once when
/// the guard is dropped.
#[must_use = "dropping a Subscription releases it immediately"]
pub(crate) struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

struct Slots<L> {
    next_id: u64,
    entries: BTreeMap<u64, L>,
}

/// Listener table for a stream source. Each `register` hands back the
/// guard that removes the entry again.
pub(crate) struct Registry<L> {
    slots: Rc<RefCell<Slots<L>>>,
}

impl<L: 'static> Registry<L> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: BTreeMap::new(),
            })),
        }
    }

    pub(crate) fn register(&self, listener: L) -> Subscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.insert(id, listener);
            id
        };

        let slots: Weak<RefCell<Slots<L>>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().entries.remove(&id);
            }
        })
    }

    pub(crate) fn for_each(&self, mut f: impl FnMut(&L)) {
        for listener in self.slots.borrow().entries.values() {
            f(listener);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().entries.len()
    }
}
