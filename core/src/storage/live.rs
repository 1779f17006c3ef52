use std::cell::RefCell;
use std::rc::Rc;

use crate::models::Note;
use crate::query::Query;

/// Handle returned by [`NoteStore::subscribe`](super::NoteStore::subscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) type Callback = Box<dyn FnMut(&[Note])>;

pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub query: Query,
    pub callback: Callback,
}

impl Subscription {
    pub fn deliver<'a, I>(&mut self, notes: I)
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let results = self.query.evaluate(notes);
        (self.callback)(&results);
    }
}

/// Latest results of a query, kept current by the store.
///
/// Holds `None` until the collection has been loaded, which is what
/// [`is_loading`](Self::is_loading) reports.
#[derive(Debug, Clone)]
pub struct LiveQuery {
    state: Rc<RefCell<Option<Vec<Note>>>>,
}

impl LiveQuery {
    pub(crate) fn new(state: Rc<RefCell<Option<Vec<Note>>>>) -> Self {
        Self { state }
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_none()
    }

    /// Snapshot of the current results; empty while loading
    pub fn data(&self) -> Vec<Note> {
        self.state.borrow().clone().unwrap_or_default()
    }

    /// Borrow the current results without cloning them
    pub fn with_data<R>(&self, f: impl FnOnce(&[Note]) -> R) -> R {
        let state = self.state.borrow();
        f(state.as_deref().unwrap_or(&[]))
    }

    pub fn len(&self) -> usize {
        self.state.borrow().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
