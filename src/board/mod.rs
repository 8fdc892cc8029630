//! Hardware and time collaborators of the event loop.
//!
//! The loop never talks to peripherals directly. Everything it needs from the
//! outside world goes through [`Board`]: the millisecond clock read at the start of
//! every tick, GPIO levels for watches, and the TTY and UART receive paths. All
//! methods must return immediately; reporting zero available bytes is the common case.
//!
//! Two implementations ship with the crate:
//! - [`sim::SimBoard`]: virtual clock and scripted inputs, for tests and simulation
//! - [`host::HostBoard`]: unix host, monotonic clock and stdin/stdout as the TTY

#[cfg(unix)]
pub mod host;
pub mod sim;

pub trait Board {
    /// Milliseconds since an arbitrary monotonic epoch.
    fn now_ms(&mut self) -> u64;

    /// Current level of `pin`, 0 or 1.
    fn gpio_read(&mut self, pin: u8) -> u8;

    /// Number of bytes waiting on the terminal.
    fn tty_available(&mut self) -> usize;

    /// Reads up to `buf.len()` terminal bytes and returns how many were read.
    fn tty_read(&mut self, buf: &mut [u8]) -> usize;

    fn tty_write(&mut self, _bytes: &[u8]) {}

    fn uart_available(&mut self, _port: u8) -> usize {
        0
    }

    fn uart_read(&mut self, _port: u8, _buf: &mut [u8]) -> usize {
        0
    }

    /// Board-specific work run once per tick, after the reap phase.
    fn custom_tick(&mut self) {}

    /// Returns peripherals to their reset state (soft reset).
    fn cleanup(&mut self) {}
}
