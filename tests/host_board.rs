#![cfg(unix)]

use tickloop::{Board, EventLoop, HostBoard, RunMode, WatchMode};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_host_clock_is_monotonic() {
    let mut board = HostBoard::new();

    let first = board.now_ms();
    let second = board.now_ms();
    assert!(second >= first);
}

#[test]
fn test_host_pins_default_low() {
    let mut board = HostBoard::default();
    board.set_pin(3, 1);
    board.set_pin(200, 1);

    assert_eq!(board.gpio_read(3), 1);
    assert_eq!(board.gpio_read(4), 0);
    assert_eq!(board.gpio_read(200), 0, "Pins outside the table read low");
}

#[test]
fn test_host_board_drives_level_watch() {
    let mut board = HostBoard::new();
    board.set_pin(7, 1);
    let mut event_loop = EventLoop::new(board);
    let fired = Rc::new(Cell::new(0));

    let watch = event_loop.watch_init();
    let counter = fired.clone();
    event_loop
        .watch_start(watch, 7, WatchMode::HighLevel, 0, move |_, _| {
            counter.set(counter.get() + 1)
        })
        .unwrap();

    event_loop.tick(RunMode::Infinite);
    event_loop.tick(RunMode::Infinite);
    assert_eq!(fired.get(), 2);
}
