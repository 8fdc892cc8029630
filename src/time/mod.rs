//! Time utilities for jobs running on the loop.
//!
//! - [`sleep`] for a future that completes once a loop timer fires
//!
//! # Example
//!
//! ```ignore
//! use tickloop::time::sleep;
//!
//! let delay = sleep(&mut event_loop, 250)?;
//! jobs.spawn(async move {
//!     delay.await;
//!     println!("250ms of loop time later");
//! })?;
//! ```

pub mod sleep;

pub use sleep::{Sleep, sleep};
