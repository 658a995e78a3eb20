//! Deferred decoding of regions inside a seekable document stream.
//!
//! A region's parser is wrapped in a [`LazyBinding`]: the binding records
//! where the region starts, runs a cheap eager step that moves the stream
//! past it, and remembers the expensive operation for later. The
//! [`Lazy`] wrapper it produces stands in for the parsed object. The
//! first access to a non-exempt member seeks back to the region, runs the
//! deferred operation once, and puts the stream back where the caller
//! left it. Every later access goes straight to the target.
//!
//! ```text
//!   LazyBinding::new(target, &stream)?       start_offset = stream position
//!       .run_eagerly("skip")?                stream moves past the region
//!       .defer_load("parse")?                recorded, not run
//!       .exempt(["width", "height"])         never trigger the load
//!       .wrap()?                             → Lazy<T, R>
//! ```
//!
//! Everything here is single-threaded: the stream handle and the wrapper
//! are `Rc`-based and therefore neither `Send` nor `Sync`.
#![warn(clippy::pedantic)]

pub mod binding;
pub mod error;
pub mod lazy;
pub mod operation;
pub mod stream;
pub mod target;

#[cfg(test)]
mod test_support;

pub use binding::LazyBinding;
pub use error::{BoxError, LazyError};
pub use lazy::{Lazy, LoadState};
pub use operation::{Arg, Operation};
pub use stream::{SeekStream, SharedStream};
pub use target::LazyTarget;
