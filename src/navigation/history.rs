use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Callback fired with the new current path after a back/forward traversal
pub type HistoryListener = Rc<dyn Fn(&str)>;

/// Handle returned by [`History::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A browser-like session history.
///
/// `push` and `replace` change the current entry silently, like `pushState` and
/// `replaceState`. Traversals (`go_back`, `go_forward`) notify subscribers, like
/// `popstate`. Paths must start with `/` and may carry a query string.
pub trait History {
    /// Path of the current entry
    fn current_path(&self) -> String;

    /// Add a new entry and make it current, dropping any forward entries
    fn push(&self, path: String);

    /// Overwrite the current entry
    fn replace(&self, path: String);

    fn can_go_back(&self) -> bool {
        true
    }

    fn go_back(&self);

    fn can_go_forward(&self) -> bool {
        true
    }

    fn go_forward(&self);

    /// Register a traversal listener
    fn subscribe(&self, listener: HistoryListener) -> ListenerId;

    /// Remove a traversal listener; unknown ids are ignored
    fn unsubscribe(&self, id: ListenerId);
}

struct MemoryHistoryState {
    current: String,
    history: Vec<String>,
    future: Vec<String>,
}

/// A [`History`] that stores all navigation information in memory.
pub struct MemoryHistory {
    state: RefCell<MemoryHistoryState>,
    listeners: RefCell<Vec<(ListenerId, HistoryListener)>>,
    next_id: Cell<u64>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::with_initial_path("/")
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryHistory")
            .field("current", &state.current)
            .field("back", &state.history.len())
            .field("forward", &state.future.len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl MemoryHistory {
    /// Create a [`MemoryHistory`] starting at `path`.
    ///
    /// ```
    /// use routewise::navigation::{History, MemoryHistory};
    ///
    /// let history = MemoryHistory::with_initial_path("/orders");
    /// assert_eq!(history.current_path(), "/orders");
    /// assert!(!history.can_go_back());
    /// ```
    pub fn with_initial_path(path: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(MemoryHistoryState {
                current: path.into(),
                history: Vec::new(),
                future: Vec::new(),
            }),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Number of entries, current one included
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.borrow();
        state.history.len() + 1 + state.future.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn notify(&self) {
        let path = self.current_path();
        // Snapshot so listeners may subscribe or navigate re-entrantly
        let listeners: Vec<HistoryListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(&path);
        }
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        self.state.borrow().current.clone()
    }

    fn push(&self, path: String) {
        let mut write = self.state.borrow_mut();
        // don't push the same path twice
        if write.current == path {
            return;
        }
        let old = std::mem::replace(&mut write.current, path);
        write.history.push(old);
        write.future.clear();
    }

    fn replace(&self, path: String) {
        self.state.borrow_mut().current = path;
    }

    fn can_go_back(&self) -> bool {
        !self.state.borrow().history.is_empty()
    }

    fn go_back(&self) {
        {
            let mut write = self.state.borrow_mut();
            let Some(last) = write.history.pop() else {
                return;
            };
            let old = std::mem::replace(&mut write.current, last);
            write.future.push(old);
        }
        self.notify();
    }

    fn can_go_forward(&self) -> bool {
        !self.state.borrow().future.is_empty()
    }

    fn go_forward(&self) {
        {
            let mut write = self.state.borrow_mut();
            let Some(next) = write.future.pop() else {
                return;
            };
            let old = std::mem::replace(&mut write.current, next);
            write.history.push(old);
        }
        self.notify();
    }

    fn subscribe(&self, listener: HistoryListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(l, _)| *l != id);
    }
}
