//! Unix host board.
//!
//! Lets the firmware core run as a plain process: the clock is `CLOCK_MONOTONIC`, the
//! TTY is stdin/stdout, and GPIO levels come from an in-memory pin table. There are no
//! UART ports.

use crate::board::Board;

use libc::{CLOCK_MONOTONIC, FIONREAD, STDIN_FILENO, STDOUT_FILENO, c_int, c_void};
use log::trace;

const PIN_COUNT: usize = 64;

pub struct HostBoard {
    pins: [u8; PIN_COUNT],
}

impl HostBoard {
    pub fn new() -> Self {
        Self {
            pins: [0; PIN_COUNT],
        }
    }

    /// Drives the simulated level of `pin`. Pins outside the table are ignored.
    pub fn set_pin(&mut self, pin: u8, level: u8) {
        if let Some(slot) = self.pins.get_mut(usize::from(pin)) {
            *slot = level;
        }
    }
}

impl Default for HostBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for HostBoard {
    fn now_ms(&mut self) -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let res = unsafe { libc::clock_gettime(CLOCK_MONOTONIC, &mut ts) };
        if res != 0 {
            return 0;
        }

        (ts.tv_sec as u64) * 1000 + (ts.tv_nsec as u64) / 1_000_000
    }

    fn gpio_read(&mut self, pin: u8) -> u8 {
        self.pins.get(usize::from(pin)).copied().unwrap_or(0)
    }

    fn tty_available(&mut self) -> usize {
        let mut pending: c_int = 0;
        let res = unsafe { libc::ioctl(STDIN_FILENO, FIONREAD, &mut pending as *mut c_int) };
        if res < 0 {
            return 0;
        }

        usize::try_from(pending).unwrap_or(0)
    }

    fn tty_read(&mut self, buf: &mut [u8]) -> usize {
        let res = unsafe { libc::read(STDIN_FILENO, buf.as_mut_ptr() as *mut c_void, buf.len()) };
        if res < 0 {
            trace!("stdin read failed: {}", std::io::Error::last_os_error());
            return 0;
        }

        res as usize
    }

    fn tty_write(&mut self, bytes: &[u8]) {
        let result = write_all(bytes, |chunk| {
            let buf = chunk.as_ptr() as *const c_void;
            let res = unsafe { libc::write(STDOUT_FILENO, buf, chunk.len()) };
            if res < 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(res as usize)
        });
        if let Err(err) = result {
            trace!("stdout write failed: {err}");
        }
    }
}

/// Feeds `bytes` to `write` until all are accepted, retrying interrupted calls.
fn write_all(
    mut bytes: &[u8],
    mut write: impl FnMut(&[u8]) -> std::io::Result<usize>,
) -> std::io::Result<()> {
    while !bytes.is_empty() {
        match write(bytes) {
            Ok(0) => return Err(std::io::ErrorKind::WriteZero.into()),
            Ok(written) => bytes = &bytes[written..],
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_write_all_retries_interrupted_writes() {
        let mut out = Vec::new();
        let mut interrupts = 2;

        let result = write_all(b"hello", |chunk| {
            if interrupts > 0 {
                interrupts -= 1;
                return Err(Error::from(ErrorKind::Interrupted));
            }
            let written = chunk.len().min(2);
            out.extend_from_slice(&chunk[..written]);
            Ok(written)
        });

        assert!(result.is_ok());
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_write_all_stops_on_other_errors() {
        let mut calls = 0;
        let result = write_all(b"hello", |_| {
            calls += 1;
            Err(Error::from(ErrorKind::BrokenPipe))
        });

        assert_eq!(result.unwrap_err().kind(), ErrorKind::BrokenPipe);
        assert_eq!(calls, 1);
    }
}
