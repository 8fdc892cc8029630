//! Simulated board with a virtual clock.
//!
//! [`SimBoard`] is cheap to clone and every clone shares the same state, so a test can
//! hand one clone to the loop and keep another to move time and inputs around:
//!
//! ```ignore
//! use tickloop::{EventLoop, RunMode, SimBoard};
//!
//! let board = SimBoard::new();
//! let mut event_loop = EventLoop::new(board.clone());
//! board.set_pin(4, 1);
//! board.advance(10);
//! event_loop.tick(RunMode::Infinite);
//! ```

use crate::board::Board;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
struct SimState {
    now: u64,
    step: u64,
    pins: HashMap<u8, u8>,
    tty_in: VecDeque<u8>,
    tty_out: Vec<u8>,
    uart_in: HashMap<u8, VecDeque<u8>>,
    custom_ticks: usize,
    cleanups: usize,
}

#[derive(Clone, Default)]
pub struct SimBoard {
    state: Rc<RefCell<SimState>>,
}

impl SimBoard {
    /// Creates a board whose clock reads 0 and whose pins are all low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board whose clock starts at `now` ms.
    pub fn starting_at(now: u64) -> Self {
        let board = Self::new();
        board.set_time(now);
        board
    }

    pub fn time(&self) -> u64 {
        self.state.borrow().now
    }

    pub fn set_time(&self, now: u64) {
        self.state.borrow_mut().now = now;
    }

    pub fn advance(&self, ms: u64) {
        self.state.borrow_mut().now += ms;
    }

    /// Makes the clock move forward by `step` ms after every read, so a loop left to
    /// [`run`](crate::EventLoop::run) sees time pass.
    pub fn set_step(&self, step: u64) {
        self.state.borrow_mut().step = step;
    }

    pub fn set_pin(&self, pin: u8, level: u8) {
        self.state.borrow_mut().pins.insert(pin, level);
    }

    pub fn push_tty(&self, bytes: &[u8]) {
        self.state.borrow_mut().tty_in.extend(bytes);
    }

    pub fn push_uart(&self, port: u8, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .uart_in
            .entry(port)
            .or_default()
            .extend(bytes);
    }

    /// Everything written to the terminal so far, drained.
    pub fn take_tty_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.borrow_mut().tty_out)
    }

    pub fn custom_ticks(&self) -> usize {
        self.state.borrow().custom_ticks
    }

    pub fn cleanups(&self) -> usize {
        self.state.borrow().cleanups
    }
}

fn drain_into(queue: &mut VecDeque<u8>, buf: &mut [u8]) -> usize {
    let len = buf.len().min(queue.len());
    for (slot, byte) in buf.iter_mut().zip(queue.drain(..len)) {
        *slot = byte;
    }
    len
}

impl Board for SimBoard {
    fn now_ms(&mut self) -> u64 {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        state.now += state.step;
        now
    }

    fn gpio_read(&mut self, pin: u8) -> u8 {
        self.state.borrow().pins.get(&pin).copied().unwrap_or(0)
    }

    fn tty_available(&mut self) -> usize {
        self.state.borrow().tty_in.len()
    }

    fn tty_read(&mut self, buf: &mut [u8]) -> usize {
        drain_into(&mut self.state.borrow_mut().tty_in, buf)
    }

    fn tty_write(&mut self, bytes: &[u8]) {
        self.state.borrow_mut().tty_out.extend_from_slice(bytes);
    }

    fn uart_available(&mut self, port: u8) -> usize {
        self.state
            .borrow()
            .uart_in
            .get(&port)
            .map_or(0, VecDeque::len)
    }

    fn uart_read(&mut self, port: u8, buf: &mut [u8]) -> usize {
        match self.state.borrow_mut().uart_in.get_mut(&port) {
            Some(queue) => drain_into(queue, buf),
            None => 0,
        }
    }

    fn custom_tick(&mut self) {
        self.state.borrow_mut().custom_ticks += 1;
    }

    fn cleanup(&mut self) {
        self.state.borrow_mut().cleanups += 1;
    }
}
