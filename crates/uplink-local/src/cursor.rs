//! Lazily evaluated listing cursors.
//!
//! Creating an iterator never fails. The listing runs on the first
//! `next`; a failure there ends the iteration and is kept for `err`.

use std::fmt;

use uplink_sys::RawError;

use crate::error::LocalResult;

type Producer<T> = Box<dyn FnOnce() -> LocalResult<Vec<T>> + Send>;

/// State behind one iterator handle.
pub(crate) struct Cursor<T> {
    pending: Option<Producer<T>>,
    items: std::vec::IntoIter<T>,
    current: Option<T>,
    error: Option<RawError>,
}

impl<T: Clone> Cursor<T> {
    pub(crate) fn new(producer: impl FnOnce() -> LocalResult<Vec<T>> + Send + 'static) -> Self {
        Self {
            pending: Some(Box::new(producer)),
            items: Vec::new().into_iter(),
            current: None,
            error: None,
        }
    }

    /// A cursor that fails on its first advance.
    pub(crate) fn failed(error: crate::error::LocalError) -> Self {
        Self::new(move || Err(error))
    }

    pub(crate) fn next(&mut self) -> bool {
        if let Some(producer) = self.pending.take() {
            match producer() {
                Ok(items) => self.items = items.into_iter(),
                Err(e) => {
                    self.error = Some(e.into_raw());
                    self.current = None;
                    return false;
                }
            }
        }
        self.current = self.items.next();
        self.current.is_some()
    }

    pub(crate) fn item(&self) -> Option<T> {
        self.current.clone()
    }

    pub(crate) fn err(&self) -> Option<RawError> {
        self.error.clone()
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("evaluated", &self.pending.is_none())
            .field("remaining", &self.items.len())
            .field("has_current", &self.current.is_some())
            .field("failed", &self.error.is_some())
            .finish()
    }
}
