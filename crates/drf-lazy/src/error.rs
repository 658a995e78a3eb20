use std::io;

/// Boxed error from a target operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring a binding or servicing an access.
///
/// ```text
///   LazyError
///   ├── UnknownOperation   ← configuration: op name not offered by target
///   ├── NoDeferredLoad     ← configuration: wrap() with nothing to defer
///   ├── EagerStep          ← eager skip failed, binding is discarded
///   ├── DeferredLoad       ← deferred op failed, binding is now Failed
///   ├── Restore            ← load succeeded but the position was not put back
///   ├── Reentrant          ← access while the target is mid-load
///   ├── TargetBorrowed     ← target already borrowed by the caller
///   ├── StreamBusy         ← stream handle already borrowed
///   └── Stream             ← tell/seek I/O failure
/// ```
#[derive(Debug, thiserror::Error)]
pub enum LazyError {
    #[error("{target} has no operation named `{name}`")]
    UnknownOperation { target: &'static str, name: String },

    #[error("wrap() called without a deferred load")]
    NoDeferredLoad,

    #[error("eager step `{op}` failed")]
    EagerStep {
        op: String,
        #[source]
        source: BoxError,
    },

    /// The deferred operation failed. It will not be retried.
    ///
    /// `restored` is false when putting the stream back also failed, in
    /// which case the cursor position is unspecified.
    #[error("deferred load `{op}` at offset {offset} failed{}", restore_note(.restored))]
    DeferredLoad {
        op: String,
        offset: u64,
        restored: bool,
        #[source]
        source: BoxError,
    },

    #[error("loaded, but could not seek back to {origin}")]
    Restore {
        origin: u64,
        #[source]
        source: io::Error,
    },

    /// A member was accessed through the wrapper while the deferred
    /// operation held the target. The load is not re-triggered.
    #[error("`{member}` accessed while its target is loading")]
    Reentrant { member: String },

    /// A member was accessed while an earlier `Ref`/`RefMut` handed out
    /// by the wrapper was still alive. Nothing was loaded.
    #[error("`{member}` accessed while the target is already borrowed")]
    TargetBorrowed { member: String },

    #[error("stream handle is already borrowed")]
    StreamBusy,

    #[error(transparent)]
    Stream(#[from] io::Error),
}

fn restore_note(restored: &bool) -> &'static str {
    if *restored {
        ""
    } else {
        " (stream position not restored)"
    }
}

impl LazyError {
    /// The error returned by the target operation, if this is one.
    pub fn operation_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::EagerStep { source, .. } | Self::DeferredLoad { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}
