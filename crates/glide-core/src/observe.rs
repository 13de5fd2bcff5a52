use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubId(u64);

struct Inner<E> {
    next: Cell<u64>,
    subs: RefCell<Vec<(SubId, Rc<dyn Fn(&E)>)>>,
}

/// A typed subscriber list. Cloning shares the list.
///
/// Subscribers may subscribe or unsubscribe from inside a notification; the
/// change takes effect from the next `notify`.
pub struct Observers<E: 'static>(Rc<Inner<E>>);

impl<E> Clone for Observers<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self(Rc::new(Inner {
            next: Cell::new(0),
            subs: RefCell::new(Vec::new()),
        }))
    }

    pub fn subscribe(&self, f: impl Fn(&E) + 'static) -> SubId {
        let id = SubId(self.0.next.get());
        self.0.next.set(id.0 + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        let mut subs = self.0.subs.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Rc<dyn Fn(&E)>> =
            self.0.subs.borrow().iter().map(|(_, f)| f.clone()).collect();
        for f in snapshot {
            f(event);
        }
    }

    pub fn len(&self) -> usize {
        self.0.subs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
