use std::borrow::Cow;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::LazyError;
use crate::operation::Operation;
use crate::stream::{SeekStream, SharedStream};
use crate::target::LazyTarget;

/// Where a wrapper is in its one-shot load.
///
/// ```text
///   Unloaded ──first non-exempt access──▶ Loading ──ok──▶ Loaded
///                                            │
///                                            └──err──▶ Failed
/// ```
///
/// `Loaded` and `Failed` are terminal. Neither one ever goes back to
/// `Unloaded`, so the deferred operation runs at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    /// True once the load has been triggered, whatever its outcome.
    #[must_use]
    pub fn is_triggered(self) -> bool {
        self != Self::Unloaded
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Binding<T, R> {
    target: RefCell<T>,
    stream: SharedStream<R>,
    start_offset: u64,
    state: Cell<LoadState>,
    deferred: Operation,
    exempt: RefCell<HashSet<Cow<'static, str>>>,
}

/// A stand-in for a target whose expensive parse has been deferred.
///
/// Every access names the member it is for. Unless that member is
/// exempt, the first access runs the deferred operation:
///
/// 1. remember the caller's stream position
/// 2. seek to the binding's start offset
/// 3. invoke the deferred operation on the target
/// 4. seek back to the remembered position, whether step 3 failed or not
///
/// Accesses after that, and all accesses to exempt members, go straight
/// to the target. A failed load is not retried; the target is left with
/// whatever state the operation wrote before failing.
///
/// Clones share the same target and state.
pub struct Lazy<T, R> {
    binding: Rc<Binding<T, R>>,
}

impl<T, R> Clone for Lazy<T, R> {
    fn clone(&self) -> Self {
        Self {
            binding: Rc::clone(&self.binding),
        }
    }
}

impl<T, R> fmt::Debug for Lazy<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("state", &self.binding.state.get())
            .field("start_offset", &self.binding.start_offset)
            .field("deferred", &self.binding.deferred.name())
            .finish_non_exhaustive()
    }
}

impl<T, R> Lazy<T, R> {
    pub(crate) fn from_parts(
        target: T,
        stream: SharedStream<R>,
        start_offset: u64,
        deferred: Operation,
        exempt: HashSet<Cow<'static, str>>,
    ) -> Self {
        Self {
            binding: Rc::new(Binding {
                target: RefCell::new(target),
                stream,
                start_offset,
                state: Cell::new(LoadState::Unloaded),
                deferred,
                exempt: RefCell::new(exempt),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.binding.state.get()
    }

    /// True once the load has been triggered, including a failed one.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state().is_triggered()
    }

    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.binding.start_offset
    }

    #[must_use]
    pub fn deferred_operation(&self) -> &Operation {
        &self.binding.deferred
    }

    #[must_use]
    pub fn is_exempt(&self, member: &str) -> bool {
        self.binding.exempt.borrow().contains(member)
    }

    /// Exempt one more member after wrapping.
    pub fn exempt(&self, member: impl Into<Cow<'static, str>>) {
        self.binding.exempt.borrow_mut().insert(member.into());
    }

    /// Recover the target once no other wrapper clone is alive.
    ///
    /// # Errors
    ///
    /// Returns the wrapper unchanged while clones exist.
    pub fn try_unwrap(self) -> Result<T, Self> {
        Rc::try_unwrap(self.binding)
            .map(|binding| binding.target.into_inner())
            .map_err(|binding| Self { binding })
    }
}

impl<T, R> Lazy<T, R>
where
    T: LazyTarget<R>,
    R: SeekStream,
{
    /// Shared access to the target on behalf of `member`.
    ///
    /// # Errors
    ///
    /// Any load error on first access, [`LazyError::Reentrant`] if the
    /// target is mid-load, or [`LazyError::TargetBorrowed`] while a
    /// `RefMut` from [`get_mut`](Self::get_mut) is alive.
    pub fn get(&self, member: &str) -> Result<Ref<'_, T>, LazyError> {
        self.intercept(member)?;
        self.binding
            .target
            .try_borrow()
            .map_err(|_| self.borrow_conflict(member))
    }

    /// Exclusive access to the target on behalf of `member`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`LazyError::TargetBorrowed`] while
    /// any earlier `Ref` is alive.
    pub fn get_mut(&self, member: &str) -> Result<RefMut<'_, T>, LazyError> {
        self.intercept(member)?;
        self.binding
            .target
            .try_borrow_mut()
            .map_err(|_| self.borrow_conflict(member))
    }

    /// Read a value from the target.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn with<U>(&self, member: &str, f: impl FnOnce(&T) -> U) -> Result<U, LazyError> {
        Ok(f(&*self.get(member)?))
    }

    /// Call a method on the target that needs `&mut`.
    ///
    /// # Errors
    ///
    /// As [`get_mut`](Self::get_mut).
    pub fn call<U>(&self, member: &str, f: impl FnOnce(&mut T) -> U) -> Result<U, LazyError> {
        Ok(f(&mut *self.get_mut(member)?))
    }

    /// Run the deferred load now if it hasn't run yet.
    ///
    /// # Errors
    ///
    /// Any load error. Calling this on a `Failed` wrapper returns `Ok`
    /// without retrying.
    pub fn force(&self) -> Result<(), LazyError> {
        if self.state().is_triggered() {
            return Ok(());
        }
        self.load("force")
    }

    fn borrow_conflict(&self, member: &str) -> LazyError {
        if self.state() == LoadState::Loading {
            LazyError::Reentrant {
                member: member.to_owned(),
            }
        } else {
            LazyError::TargetBorrowed {
                member: member.to_owned(),
            }
        }
    }

    fn intercept(&self, member: &str) -> Result<(), LazyError> {
        if self.state().is_triggered() || self.is_exempt(member) {
            return Ok(());
        }
        self.load(member)
    }

    fn load(&self, member: &str) -> Result<(), LazyError> {
        let binding = &*self.binding;

        // Take both borrows before touching the state so a busy stream
        // leaves the wrapper Unloaded and retryable.
        let mut stream = binding.stream.borrow_mut()?;
        let mut target = binding
            .target
            .try_borrow_mut()
            .map_err(|_| self.borrow_conflict(member))?;
        binding.state.set(LoadState::Loading);

        let origin = match stream.current_position() {
            Ok(origin) => origin,
            Err(e) => {
                binding.state.set(LoadState::Failed);
                return Err(LazyError::Stream(e));
            }
        };

        let outcome = match stream.seek_to(binding.start_offset) {
            Err(e) => Err(LazyError::Stream(e)),
            Ok(()) => target
                .invoke(&binding.deferred, &mut *stream)
                .map_err(|e| LazyError::DeferredLoad {
                    op: binding.deferred.to_string(),
                    offset: binding.start_offset,
                    restored: true,
                    source: Box::new(e),
                }),
        };
        let restore = stream.seek_to(origin);

        match (outcome, restore) {
            (Ok(()), Ok(())) => {
                binding.state.set(LoadState::Loaded);
                Ok(())
            }
            (Ok(()), Err(source)) => {
                binding.state.set(LoadState::Loaded);
                Err(LazyError::Restore { origin, source })
            }
            (Err(mut err), restore) => {
                binding.state.set(LoadState::Failed);
                if let (LazyError::DeferredLoad { restored, .. }, Err(_)) = (&mut err, &restore) {
                    *restored = false;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::LazyBinding;
    use crate::test_support::{Probe, Tracked, tracked};
    use std::io::Cursor;

    /// Region at 100, eager skip to 500, deferred parse of 16 bytes.
    fn probe_at_100(stream: &SharedStream<Tracked>) -> Lazy<Probe, Tracked> {
        LazyBinding::new(Probe::default(), stream)
            .unwrap()
            .run_eagerly(Operation::new("skip").arg(400u64))
            .unwrap()
            .defer_load(Operation::new("parse").arg(16u64))
            .unwrap()
            .exempt(["width", "height"])
            .wrap()
            .unwrap()
    }

    fn seeks(stream: &SharedStream<Tracked>) -> usize {
        stream.borrow_mut().unwrap().seeks
    }

    #[test]
    fn exempt_member_served_without_loading() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        assert_eq!(stream.current_position().unwrap(), 500);

        assert_eq!(lazy.with("width", |p| p.width).unwrap(), 640);
        assert_eq!(lazy.with("height", |p| p.loads).unwrap(), 0);
        assert_eq!(lazy.state(), LoadState::Unloaded);
        assert_eq!(stream.current_position().unwrap(), 500);
    }

    #[test]
    fn first_access_loads_from_start_and_restores() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);

        let pixels = lazy.with("pixels", |p| p.pixels.clone()).unwrap();
        // Byte i of the stream is i as u8.
        assert_eq!(pixels, (100u8..116).collect::<Vec<_>>());
        assert_eq!(lazy.with("width", |p| p.load_offsets.clone()).unwrap(), [100]);
        assert_eq!(lazy.state(), LoadState::Loaded);
        assert_eq!(stream.current_position().unwrap(), 500);
    }

    #[test]
    fn load_runs_once_and_later_access_never_seeks() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);

        lazy.with("pixels", |_| ()).unwrap();
        let after_load = seeks(&stream);
        for member in ["pixels", "row", "width", "pixels"] {
            lazy.with(member, |_| ()).unwrap();
        }
        lazy.force().unwrap();
        assert_eq!(seeks(&stream), after_load);
        assert_eq!(lazy.with("pixels", |p| p.loads).unwrap(), 1);
    }

    #[test]
    fn load_uses_start_offset_after_caller_moves_stream() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        stream.seek_to(42).unwrap();

        lazy.force().unwrap();
        assert_eq!(lazy.with("width", |p| p.load_offsets.clone()).unwrap(), [100]);
        assert_eq!(stream.current_position().unwrap(), 42);
    }

    #[test]
    fn method_calls_are_intercepted_too() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);

        lazy.call("width", |p| p.width += 1).unwrap();
        assert!(!lazy.is_loaded());
        lazy.call("clear_pixels", |p| p.pixels.clear()).unwrap();
        assert!(lazy.is_loaded());
        assert!(lazy.with("pixels", |p| p.pixels.is_empty()).unwrap());
    }

    #[test]
    fn late_exemption_applies_to_later_accesses() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        lazy.exempt("alt_text");
        assert!(lazy.is_exempt("alt_text"));
        lazy.with("alt_text", |_| ()).unwrap();
        assert_eq!(lazy.state(), LoadState::Unloaded);
    }

    #[test]
    fn failed_load_restores_position_and_is_not_retried() {
        let stream = tracked(1000, 100);
        let lazy = failing_at_100(&stream);

        let err = lazy.force().unwrap_err();
        assert!(matches!(
            err,
            LazyError::DeferredLoad { offset: 100, restored: true, .. }
        ));
        assert_eq!(lazy.state(), LoadState::Failed);
        assert_eq!(stream.current_position().unwrap(), 500);

        // Partial state stays, and nothing runs again.
        let seeks_before = seeks(&stream);
        assert_eq!(lazy.with("pixels", |p| p.pixels.clone()).unwrap(), [0xEE]);
        lazy.force().unwrap();
        assert_eq!(lazy.with("pixels", |p| p.loads).unwrap(), 1);
        assert_eq!(seeks(&stream), seeks_before);
    }

    fn failing_at_100(stream: &SharedStream<Tracked>) -> Lazy<Probe, Tracked> {
        LazyBinding::new(Probe::default(), stream)
            .unwrap()
            .run_eagerly(Operation::new("skip").arg(400u64))
            .unwrap()
            .defer_load("fail")
            .unwrap()
            .wrap()
            .unwrap()
    }

    #[test]
    fn unreadable_origin_fails_load_without_running_it() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        stream.borrow_mut().unwrap().fail_position = true;

        assert!(matches!(lazy.force(), Err(LazyError::Stream(_))));
        assert_eq!(lazy.state(), LoadState::Failed);
        stream.borrow_mut().unwrap().fail_position = false;
        assert_eq!(lazy.with("pixels", |p| p.loads).unwrap(), 0);
        assert_eq!(stream.current_position().unwrap(), 500);
    }

    #[test]
    fn seek_to_start_failure_still_restores() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        let before = seeks(&stream);
        stream.borrow_mut().unwrap().fail_nth_seek(1);

        assert!(matches!(lazy.force(), Err(LazyError::Stream(_))));
        assert_eq!(lazy.state(), LoadState::Failed);
        // Failed seek to start, then the restore.
        assert_eq!(seeks(&stream), before + 2);
        assert_eq!(lazy.with("pixels", |p| p.loads).unwrap(), 0);
        assert_eq!(stream.current_position().unwrap(), 500);
    }

    #[test]
    fn restore_failure_after_successful_load() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        stream.borrow_mut().unwrap().fail_nth_seek(2);

        assert!(matches!(
            lazy.force(),
            Err(LazyError::Restore { origin: 500, .. })
        ));
        assert_eq!(lazy.state(), LoadState::Loaded);
        assert_eq!(
            lazy.with("pixels", |p| p.pixels.clone()).unwrap(),
            (100u8..116).collect::<Vec<_>>()
        );
        // Left where the parse stopped.
        assert_eq!(stream.current_position().unwrap(), 116);
    }

    #[test]
    fn failed_load_with_failed_restore_reports_unrestored() {
        let stream = tracked(1000, 100);
        let lazy = failing_at_100(&stream);
        // Seek to start, the target's own seek, then the restore.
        stream.borrow_mut().unwrap().fail_nth_seek(3);

        let err = lazy.force().unwrap_err();
        assert!(matches!(
            err,
            LazyError::DeferredLoad { offset: 100, restored: false, .. }
        ));
        assert!(err.to_string().ends_with("(stream position not restored)"));
        assert_eq!(lazy.state(), LoadState::Failed);
        assert_eq!(stream.current_position().unwrap(), 9999);
    }

    #[test]
    fn held_borrow_is_not_reported_as_reentrant() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);

        let width = lazy.get("width").unwrap();
        assert!(matches!(
            lazy.get_mut("width"),
            Err(LazyError::TargetBorrowed { .. })
        ));
        // A load cannot start while the caller holds the target.
        assert!(matches!(
            lazy.get("pixels"),
            Err(LazyError::TargetBorrowed { .. })
        ));
        assert_eq!(lazy.state(), LoadState::Unloaded);
        drop(width);

        lazy.force().unwrap();
        let pixels = lazy.get("pixels").unwrap();
        assert!(matches!(
            lazy.call("clear_pixels", |p| p.pixels.clear()),
            Err(LazyError::TargetBorrowed { .. })
        ));
        drop(pixels);
    }

    #[test]
    fn busy_stream_leaves_wrapper_unloaded() {
        let stream = tracked(1000, 100);
        let lazy = probe_at_100(&stream);
        {
            let _held = stream.borrow_mut().unwrap();
            assert!(matches!(lazy.get("pixels"), Err(LazyError::StreamBusy)));
        }
        assert_eq!(lazy.state(), LoadState::Unloaded);
        lazy.force().unwrap();
        assert_eq!(lazy.state(), LoadState::Loaded);
    }

    #[test]
    fn clones_share_state() {
        let stream = tracked(1000, 100);
        let a = probe_at_100(&stream);
        let b = a.clone();
        a.force().unwrap();
        assert_eq!(b.state(), LoadState::Loaded);
        assert!(b.try_unwrap().is_err());
        assert_eq!(a.try_unwrap().unwrap().loads, 1);
    }

    // A target whose deferred load reaches back into its own wrapper.

    type Loop = Lazy<Reentering, Cursor<Vec<u8>>>;

    #[derive(Default)]
    struct Reentering {
        slot: Rc<RefCell<Option<Loop>>>,
        inner_error: Option<String>,
        loads: usize,
    }

    impl LazyTarget<Cursor<Vec<u8>>> for Reentering {
        type Error = std::io::Error;

        const OPERATIONS: &'static [&'static str] = &["load"];

        fn invoke(&mut self, _op: &Operation, _stream: &mut Cursor<Vec<u8>>) -> std::io::Result<()> {
            self.loads += 1;
            let handle = self.slot.borrow().clone();
            if let Some(lazy) = handle {
                self.inner_error = lazy.with("payload", |_| ()).err().map(|e| e.to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn access_during_load_is_reentrant_error_not_recursion() {
        let slot = Rc::new(RefCell::new(None));
        let stream = SharedStream::new(Cursor::new(vec![0u8; 16]));
        let target = Reentering {
            slot: Rc::clone(&slot),
            ..Reentering::default()
        };
        let lazy = LazyBinding::new(target, &stream)
            .unwrap()
            .defer_load("load")
            .unwrap()
            .wrap()
            .unwrap();
        *slot.borrow_mut() = Some(lazy.clone());

        lazy.force().unwrap();
        let (loads, inner_error) = lazy
            .with("payload", |t| (t.loads, t.inner_error.clone()))
            .unwrap();
        assert_eq!(loads, 1);
        assert_eq!(
            inner_error.as_deref(),
            Some("`payload` accessed while its target is loading")
        );
        slot.borrow_mut().take();
    }
}
