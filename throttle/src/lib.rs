//! Bounded concurrency for file operations
//!
//! This crate caps how many copy operations may be in flight at the same time. A
//! [`ConcurrencyLimit`] is created once per invocation and shared between the tasks that
//! perform I/O. Each task acquires a [`Permit`] before touching the filesystem; the permit
//! frees its slot when dropped.
//!
//! # Usage
//!
//! ```rust,no_run
//! use throttle::ConcurrencyLimit;
//! use std::num::NonZeroUsize;
//!
//! # async fn example() {
//! let limit = ConcurrencyLimit::new(NonZeroUsize::new(4).unwrap());
//! let permit = limit.permit().await;
//! tokio::spawn(async move {
//!     let _permit = permit;
//!     // copy a file here - the slot is released when `_permit` goes out of scope
//! });
//! # }
//! ```
//!
//! # Accounting
//!
//! Besides gating, the limiter keeps track of the number of permits currently held and the
//! highest number ever held at once. Both are plain atomic counters and are safe to read from
//! any task.
//!
//! Excess requests park on the underlying `tokio::sync::Semaphore` and are woken in FIFO
//! order as slots free up.

mod semaphore;

pub use semaphore::{ConcurrencyLimit, Permit};
