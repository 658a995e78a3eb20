use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::LazyError;
use crate::lazy::Lazy;
use crate::operation::Operation;
use crate::stream::{SeekStream, SharedStream};
use crate::target::LazyTarget;

/// Builder that turns a target and a stream into a [`Lazy`] wrapper.
///
/// The start offset is captured from the stream when the binding is
/// created, before any eager step runs. Every builder method consumes
/// and returns the binding, so a failed step drops the half-configured
/// binding along with its target.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────┐
/// │ Method       │ Effect                                       │
/// ├──────────────┼──────────────────────────────────────────────┤
/// │ new          │ record start_offset = stream position        │
/// │ run_eagerly  │ invoke now, stream advances                  │
/// │ defer_load   │ record the load op (last call wins)          │
/// │ exempt       │ members that never trigger the load          │
/// │ wrap         │ produce the wrapper, requires a deferred op  │
/// └──────────────┴──────────────────────────────────────────────┘
/// ```
pub struct LazyBinding<T, R> {
    target: T,
    stream: SharedStream<R>,
    start_offset: u64,
    deferred: Option<Operation>,
    exempt: HashSet<Cow<'static, str>>,
}

impl<T, R> LazyBinding<T, R>
where
    T: LazyTarget<R>,
    R: SeekStream,
{
    /// Bind `target` to the stream at its current position.
    ///
    /// # Errors
    ///
    /// [`LazyError::StreamBusy`] or an I/O error reading the position.
    pub fn new(target: T, stream: &SharedStream<R>) -> Result<Self, LazyError> {
        let start_offset = stream.current_position()?;
        Ok(Self {
            target,
            stream: stream.clone(),
            start_offset,
            deferred: None,
            exempt: HashSet::new(),
        })
    }

    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// The target as configured so far.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Invoke `op` on the target immediately, against the stream's
    /// current position.
    ///
    /// # Errors
    ///
    /// - [`LazyError::UnknownOperation`] if the target doesn't offer `op`.
    /// - [`LazyError::StreamBusy`] if the stream is borrowed elsewhere.
    /// - [`LazyError::EagerStep`] wrapping the target's own error.
    pub fn run_eagerly(mut self, op: impl Into<Operation>) -> Result<Self, LazyError> {
        let op = op.into();
        check_operation::<T, R>(&op)?;
        {
            let mut stream = self.stream.borrow_mut()?;
            self.target
                .invoke(&op, &mut *stream)
                .map_err(|e| LazyError::EagerStep {
                    op: op.to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(self)
    }

    /// Record `op` as the deferred load. A later call replaces it.
    ///
    /// # Errors
    ///
    /// [`LazyError::UnknownOperation`] if the target doesn't offer `op`.
    pub fn defer_load(mut self, op: impl Into<Operation>) -> Result<Self, LazyError> {
        let op = op.into();
        check_operation::<T, R>(&op)?;
        self.deferred = Some(op);
        Ok(self)
    }

    /// Mark members that are served without triggering the load.
    #[must_use]
    pub fn exempt<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.exempt.extend(members.into_iter().map(Into::into));
        self
    }

    /// Finish configuration.
    ///
    /// # Errors
    ///
    /// [`LazyError::NoDeferredLoad`] if `defer_load` was never called.
    pub fn wrap(self) -> Result<Lazy<T, R>, LazyError> {
        let deferred = self.deferred.ok_or(LazyError::NoDeferredLoad)?;
        Ok(Lazy::from_parts(
            self.target,
            self.stream,
            self.start_offset,
            deferred,
            self.exempt,
        ))
    }
}

fn check_operation<T, R>(op: &Operation) -> Result<(), LazyError>
where
    T: LazyTarget<R>,
    R: SeekStream,
{
    if T::OPERATIONS.iter().any(|&name| name == op.name()) {
        Ok(())
    } else {
        Err(LazyError::UnknownOperation {
            target: T::target_name(),
            name: op.name().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Probe, ProbeError, tracked};

    #[test]
    fn start_offset_is_position_at_creation() {
        let stream = tracked(1000, 100);
        let binding = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .run_eagerly(Operation::new("skip").arg(400u64))
            .unwrap();
        assert_eq!(binding.start_offset(), 100);
        assert_eq!(stream.current_position().unwrap(), 500);
        assert_eq!(binding.target().width, 640);
    }

    #[test]
    fn unknown_eager_operation_rejected_without_running() {
        let stream = tracked(64, 0);
        let err = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .run_eagerly("inflate")
            .err()
            .unwrap();
        match err {
            LazyError::UnknownOperation { name, target } => {
                assert_eq!(name, "inflate");
                assert!(target.ends_with("Probe"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stream.current_position().unwrap(), 0);
    }

    #[test]
    fn unknown_deferred_operation_rejected() {
        let stream = tracked(64, 0);
        let result = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .defer_load("inflate");
        assert!(matches!(result, Err(LazyError::UnknownOperation { .. })));
    }

    #[test]
    fn wrap_without_deferred_load_fails() {
        let stream = tracked(64, 0);
        let result = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .exempt(["width"])
            .wrap();
        assert!(matches!(result, Err(LazyError::NoDeferredLoad)));
    }

    #[test]
    fn eager_failure_surfaces_target_error() {
        let stream = tracked(64, 0);
        let err = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .run_eagerly("fail")
            .err()
            .unwrap();
        assert!(matches!(err, LazyError::EagerStep { ref op, .. } if op == "fail()"));
        let source = err.operation_error().unwrap();
        assert!(source.downcast_ref::<ProbeError>().is_some());
    }

    #[test]
    fn last_deferred_load_wins() {
        let stream = tracked(64, 0);
        let lazy = LazyBinding::new(Probe::default(), &stream)
            .unwrap()
            .defer_load("fail")
            .unwrap()
            .defer_load(Operation::new("parse").arg(4u64))
            .unwrap()
            .wrap()
            .unwrap();
        assert_eq!(lazy.deferred_operation().name(), "parse");
        assert_eq!(lazy.with("pixels", |p| p.pixels.len()).unwrap(), 4);
    }

    #[test]
    fn eager_step_with_busy_stream() {
        let stream = tracked(64, 0);
        let binding = LazyBinding::new(Probe::default(), &stream).unwrap();
        let _held = stream.borrow_mut().unwrap();
        assert!(matches!(
            binding.run_eagerly(Operation::new("skip").arg(1u64)),
            Err(LazyError::StreamBusy)
        ));
    }
}
