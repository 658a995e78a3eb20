use std::cell::{RefCell, RefMut};
use std::io::{self, Seek, SeekFrom};
use std::rc::Rc;

use crate::error::LazyError;

/// The two stream capabilities a lazy binding depends on.
///
/// Anything that implements [`Seek`] gets this for free. Targets receive
/// the full stream type `R` and can additionally rely on whatever else
/// they bound it by (usually [`std::io::Read`]).
pub trait SeekStream {
    /// Current absolute byte offset.
    ///
    /// # Errors
    ///
    /// The underlying I/O error.
    fn current_position(&mut self) -> io::Result<u64>;

    /// Move to an absolute byte offset.
    ///
    /// # Errors
    ///
    /// The underlying I/O error.
    fn seek_to(&mut self, offset: u64) -> io::Result<()>;
}

impl<S: Seek + ?Sized> SeekStream for S {
    fn current_position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

/// A stream handle shared between a reader and the lazy wrappers it
/// hands out.
///
/// Clones refer to the same stream and the same cursor. Each access
/// borrows the stream for the duration of one operation; a second
/// concurrent borrow fails with [`LazyError::StreamBusy`] instead of
/// panicking.
pub struct SharedStream<R> {
    inner: Rc<RefCell<R>>,
}

impl<R> Clone for SharedStream<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R> std::fmt::Debug for SharedStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("handles", &self.handles())
            .field("busy", &self.inner.try_borrow_mut().is_err())
            .finish()
    }
}

impl<R> SharedStream<R> {
    pub fn new(stream: R) -> Self {
        Self {
            inner: Rc::new(RefCell::new(stream)),
        }
    }

    /// Exclusive access to the stream.
    ///
    /// # Errors
    ///
    /// [`LazyError::StreamBusy`] if the stream is already borrowed.
    pub fn borrow_mut(&self) -> Result<RefMut<'_, R>, LazyError> {
        self.inner.try_borrow_mut().map_err(|_| LazyError::StreamBusy)
    }

    /// Number of live handles, including wrappers that hold one.
    #[must_use]
    pub fn handles(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Take the stream back once every other handle is gone.
    ///
    /// # Errors
    ///
    /// Returns the handle unchanged while other handles exist.
    pub fn try_into_inner(self) -> Result<R, Self> {
        Rc::try_unwrap(self.inner)
            .map(RefCell::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<R: SeekStream> SharedStream<R> {
    /// # Errors
    ///
    /// [`LazyError::StreamBusy`] or the underlying I/O error.
    pub fn current_position(&self) -> Result<u64, LazyError> {
        Ok(self.borrow_mut()?.current_position()?)
    }

    /// # Errors
    ///
    /// [`LazyError::StreamBusy`] or the underlying I/O error.
    pub fn seek_to(&self, offset: u64) -> Result<(), LazyError> {
        Ok(self.borrow_mut()?.seek_to(offset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn clones_share_one_cursor() {
        let a = SharedStream::new(Cursor::new(vec![0u8; 64]));
        let b = a.clone();
        a.seek_to(40).unwrap();
        assert_eq!(b.current_position().unwrap(), 40);
        assert_eq!(a.handles(), 2);
    }

    #[test]
    fn nested_borrow_is_busy_not_panic() {
        let stream = SharedStream::new(Cursor::new(vec![0u8; 8]));
        let _held = stream.borrow_mut().unwrap();
        assert!(matches!(stream.current_position(), Err(LazyError::StreamBusy)));
    }

    #[test]
    fn into_inner_waits_for_last_handle() {
        let a = SharedStream::new(Cursor::new(vec![1u8, 2, 3]));
        let b = a.clone();
        let a = a.try_into_inner().unwrap_err();
        drop(b);
        assert_eq!(a.try_into_inner().unwrap().into_inner(), vec![1, 2, 3]);
    }
}
