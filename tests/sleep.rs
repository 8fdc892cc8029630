use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use std::cell::Cell;
use std::rc::Rc;
use tickloop::time::sleep;
use tickloop::{EventLoop, HandleType, RunMode, SimBoard};

#[test]
fn test_sleep_completes_after_deadline() {
    let board = SimBoard::starting_at(100);
    let mut event_loop = EventLoop::new(board.clone());
    let mut pool = LocalPool::new();
    let done = Rc::new(Cell::new(false));

    let delay = sleep(&mut event_loop, 30).unwrap();
    let flag = done.clone();
    pool.spawner()
        .spawn_local(async move {
            delay.await;
            flag.set(true);
        })
        .unwrap();

    for now in [100, 120, 130] {
        board.set_time(now);
        event_loop.tick(RunMode::Infinite);
        pool.run_until_stalled();
        assert!(!done.get(), "Sleep must not complete at {now}ms");
    }

    board.set_time(131);
    event_loop.tick(RunMode::Infinite);
    pool.run_until_stalled();

    assert!(done.get());
    assert!(
        event_loop.handle_count(HandleType::Timer) == 0 && event_loop.closing_count() == 0,
        "Sleep timer should close itself"
    );
}

#[test]
fn test_sleep_completes_when_timer_is_freed() {
    let board = SimBoard::new();
    let mut event_loop = EventLoop::new(board);
    let mut pool = LocalPool::new();
    let done = Rc::new(Cell::new(false));

    let delay = sleep(&mut event_loop, 1_000).unwrap();
    let flag = done.clone();
    pool.spawner()
        .spawn_local(async move {
            delay.await;
            flag.set(true);
        })
        .unwrap();

    pool.run_until_stalled();
    assert!(!done.get());

    event_loop.cleanup();
    pool.run_until_stalled();
    assert!(done.get());
}

#[test]
fn test_quiescent_loop_runs_until_sleep_fires() {
    let board = SimBoard::new();
    board.set_step(10);
    let mut event_loop = EventLoop::new(board);

    let _delay = sleep(&mut event_loop, 45).unwrap();
    event_loop.run(RunMode::Quiescent);

    assert!(event_loop.now() > 45);
}
