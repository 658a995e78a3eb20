use crate::operation::Operation;

/// An object whose parsing can be split into a cheap eager step and an
/// expensive deferred one.
///
/// `OPERATIONS` lists the operation names the target accepts. A binding
/// refuses any other name up front with
/// [`LazyError::UnknownOperation`](crate::LazyError::UnknownOperation),
/// so `invoke` only ever sees names from this list.
///
/// When invoked as the deferred load, the stream is already positioned
/// at the offset the binding was created at. The target may leave the
/// stream anywhere; the wrapper restores the caller's position after.
pub trait LazyTarget<R: ?Sized> {
    type Error: std::error::Error + Send + Sync + 'static;

    const OPERATIONS: &'static [&'static str];

    /// Run the operation named by `op` against `stream`.
    ///
    /// # Errors
    ///
    /// Whatever the operation reports. Partial state written to `self`
    /// before an error stays in place.
    fn invoke(&mut self, op: &Operation, stream: &mut R) -> Result<(), Self::Error>;

    /// Name used in configuration errors.
    #[must_use]
    fn target_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
