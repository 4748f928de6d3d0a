//! Navigation history, modelled on a browser's session history.
//!
//! ```text
//!   entries        cursor    operation
//!   /a /b /x       /b        push("/c")
//!   /a /b /c       /c        replace("/login")
//!   /a /b /login   /login
//! ```
//!
//! Each entry can carry a [`RedirectRequest`] as its state. That is how the
//! sign-in page learns where the viewer was headed, and how notices such as
//! "password updated" reach it without a global flag. The state belongs to
//! the entry, so going back to an entry brings its state back with it.

use crate::RedirectRequest;

/// One entry in the history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub path: String,
    /// State attached by whoever navigated here, if any.
    pub state: Option<RedirectRequest>,
}

/// A stack of visited paths with a cursor.
///
/// `push` drops everything after the cursor, like following a link after
/// going back. `replace` swaps the current entry in place, so "back" never
/// returns to it; the guard uses that for denied routes.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl History {
    /// History with a single entry, the path the app was opened at.
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                path: initial_path.into(),
                state: None,
            }],
            index: 0,
        }
    }

    /// Adds a new entry after the current one and moves onto it.
    ///
    /// Any entries ahead of the cursor (left behind by [`back`](Self::back))
    /// are discarded first, so [`forward`](Self::forward) has nowhere to go
    /// afterwards.
    pub fn push(&mut self, path: impl Into<String>, state: Option<RedirectRequest>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            path: path.into(),
            state,
        });
        self.index = self.entries.len() - 1;
    }

    /// Overwrites the current entry, path and state both.
    ///
    /// The length and the cursor stay put. Used for redirects: the replaced
    /// entry is gone, so going back skips it instead of bouncing into the
    /// redirect again.
    pub fn replace(&mut self, path: impl Into<String>, state: Option<RedirectRequest>) {
        self.entries[self.index] = HistoryEntry {
            path: path.into(),
            state,
        };
    }

    /// Moves one entry back. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.can_go_back() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Moves one entry forward. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.can_go_forward() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    pub fn current_path(&self) -> &str {
        &self.current().path
    }

    pub fn current_state(&self) -> Option<&RedirectRequest> {
        self.current().state.as_ref()
    }

    /// Removes and returns the current entry's state. A second call
    /// returns `None`.
    pub fn take_state(&mut self) -> Option<RedirectRequest> {
        self.entries[self.index].state.take()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: history holds at least the entry it was opened at.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every path in the stack, oldest first.
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_single_entry() {
        let history = History::new("/messages");

        assert_eq!(history.current_path(), "/messages");
        assert_eq!(history.len(), 1);
        assert!(!history.can_go_back());
        assert!(!history.is_empty());
    }

    #[test]
    fn test_push_then_back_and_forward() {
        let mut history = History::new("/");
        history.push("/explore", None);

        assert!(history.back());
        assert_eq!(history.current_path(), "/");
        assert!(!history.back());
        assert!(history.forward());
        assert_eq!(history.current_path(), "/explore");
        assert!(!history.forward());
    }

    #[test]
    fn test_push_after_back_drops_forward_entries() {
        let mut history = History::new("/");
        history.push("/explore", None);
        history.push("/messages", None);
        history.back();

        history.push("/notifications", None);

        assert_eq!(history.paths(), vec!["/", "/explore", "/notifications"]);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_replace_removes_entry_from_back_stack() {
        let mut history = History::new("/");
        history.push("/connections", None);

        history.replace(
            "/login",
            Some(RedirectRequest::denied("/login", "/connections", None)),
        );

        assert_eq!(history.paths(), vec!["/", "/login"]);
        history.back();
        assert_eq!(history.current_path(), "/");
    }

    #[test]
    fn test_take_state_consumes_once() {
        let mut history = History::new("/");
        history.push("/login", Some(RedirectRequest::notice("/login", "hello")));

        assert!(history.current_state().is_some());
        assert!(history.take_state().is_some());
        assert!(history.take_state().is_none());
        assert!(history.current_state().is_none());
    }
}
