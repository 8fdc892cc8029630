//! Cooperative hardware event loop for script-driven microcontroller firmware.
//!
//! This crate provides the single-threaded scheduler that sits between a board's
//! peripherals and a scripting engine. Hardware event sources are registered as
//! handles; every tick the loop polls them in a fixed order and runs their callbacks
//! to completion, one at a time.
//!
//! # Architecture
//!
//! - **EventLoop**: Owns the virtual clock, the handle arena and one list per handle kind
//! - **Handles**: Timers, GPIO watches, TTY and UART readers, idle hooks and (inert) streams
//! - **Closing list**: Closed handles are reaped in a dedicated phase, never mid-callback
//! - **Board**: Time source and non-blocking peripheral reads the loop depends on
//! - **Runtime**: Drives a script engine and drains its job queue once per tick
//! - **EventLoopBuilder**: Fluent builder for loop instantiation
//!
//! # Tick order
//!
//! `update_time → timers → ttys → watches → uarts → idles → reap closing → board hook`

mod builder;
mod error;
mod io;
mod utils;

pub mod board;
pub mod runtime;
pub mod time;

pub use board::Board;
#[cfg(unix)]
pub use board::host::HostBoard;
pub use board::sim::SimBoard;
pub use builder::EventLoopBuilder;
pub use error::{BuildError, Error, Result, ScriptError};
pub use io::core::{EventLoop, RunMode};
pub use io::handle::{CloseCallback, Handle, HandleFlags, HandleId, HandleKey, HandleType};
pub use io::idle::{Idle, IdleCallback};
pub use io::stream::{Stream, StreamAvailableCallback};
pub use io::timer::{Timer, TimerCallback};
pub use io::tty::{ReadCallback, Tty};
pub use io::uart::{AvailableCallback, Uart};
pub use io::watch::{Watch, WatchCallback, WatchMode};
