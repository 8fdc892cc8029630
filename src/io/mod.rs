//! Cooperative I/O event loop.
//!
//! This module provides the scheduler that turns hardware activity into callbacks:
//! - [`core`]: the loop, its tick algorithm and the generic handle manager
//! - [`handle`]: handle identity, kind and lifecycle flags
//! - [`timer`], [`tty`], [`watch`], [`uart`], [`idle`], [`stream`]: per-kind managers

pub mod core;
pub mod handle;
pub mod idle;
pub mod stream;
pub mod timer;
pub mod tty;
pub mod uart;
pub mod watch;
