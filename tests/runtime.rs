use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::rc::Rc;
use tickloop::runtime::{JobQueue, Runtime, ScriptEngine, VmStop};
use tickloop::{EventLoop, HandleType, RunMode, ScriptError, SimBoard};

#[derive(Default)]
struct Stats {
    inits: usize,
    cleanups: usize,
    drains: usize,
    log: Vec<&'static str>,
}

/// Engine that understands a handful of canned programs.
#[derive(Default)]
struct MockEngine {
    stats: Rc<RefCell<Stats>>,
    jobs: JobQueue,
    stop: Option<VmStop>,
}

impl ScriptEngine for MockEngine {
    fn init(&mut self, _event_loop: &mut EventLoop, stop: VmStop) -> Result<(), ScriptError> {
        self.stats.borrow_mut().inits += 1;
        self.stop = Some(stop);
        Ok(())
    }

    fn eval(&mut self, event_loop: &mut EventLoop, source: &[u8]) -> Result<(), ScriptError> {
        match source {
            b"syntax error" => Err(ScriptError::Parse("unexpected token".into())),
            b"blink" => {
                let timer = event_loop.timer_init();
                event_loop.timer_start(timer, 500, true, |_, _| {})?;
                Ok(())
            }
            b"blink then throw" => {
                let timer = event_loop.timer_init();
                event_loop.timer_start(timer, 500, true, |_, _| {})?;
                Err(ScriptError::Runtime("boom".into()))
            }
            b"sleep" => {
                let sleep = tickloop::time::sleep(event_loop, 50)?;
                let stats = self.stats.clone();
                self.jobs.spawn(async move {
                    sleep.await;
                    stats.borrow_mut().log.push("woke");
                })?;
                Ok(())
            }
            b"chain" => {
                let spawner = self.jobs.spawner();
                let stats = self.stats.clone();
                self.jobs.spawn(async move {
                    stats.borrow_mut().log.push("outer");
                    let inner = stats.clone();
                    spawner
                        .spawn_local(async move { inner.borrow_mut().log.push("inner") })
                        .unwrap();
                })?;
                Ok(())
            }
            b"spin" => match &self.stop {
                Some(stop) if stop.take() => Err(ScriptError::Aborted),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn run_enqueued_jobs(&mut self, _event_loop: &mut EventLoop) -> Result<(), ScriptError> {
        self.stats.borrow_mut().drains += 1;
        self.jobs.run_until_stalled();
        Ok(())
    }

    fn cleanup(&mut self) {
        self.stats.borrow_mut().cleanups += 1;
        self.jobs = JobQueue::new();
    }
}

fn setup(now: u64) -> (SimBoard, EventLoop, Runtime<MockEngine>, Rc<RefCell<Stats>>) {
    let board = SimBoard::starting_at(now);
    let event_loop = EventLoop::new(board.clone());
    let engine = MockEngine::default();
    let stats = engine.stats.clone();
    (board, event_loop, Runtime::new(engine), stats)
}

#[test]
fn test_idler_drains_jobs_every_tick() {
    let (_board, mut event_loop, mut runtime, stats) = setup(0);
    runtime.init(&mut event_loop, None).unwrap();

    assert_eq!(event_loop.handle_count(HandleType::Idle), 1);
    for _ in 0..3 {
        event_loop.tick(RunMode::Infinite);
    }
    assert_eq!(stats.borrow().drains, 3);
}

#[test]
fn test_init_registers_idler_once() {
    let (_board, mut event_loop, mut runtime, stats) = setup(0);

    runtime.init(&mut event_loop, None).unwrap();
    let idler = runtime.idler();
    runtime.init(&mut event_loop, None).unwrap();

    assert_eq!(stats.borrow().inits, 2);
    assert_eq!(runtime.idler(), idler);
    assert_eq!(event_loop.handle_count(HandleType::Idle), 1);
}

#[test]
fn test_busy_engine_skips_drain() {
    let (_board, mut event_loop, mut runtime, stats) = setup(0);
    runtime.init(&mut event_loop, None).unwrap();

    {
        let _busy = runtime.engine().borrow_mut();
        event_loop.tick(RunMode::Infinite);
    }
    assert_eq!(stats.borrow().drains, 0);

    event_loop.tick(RunMode::Infinite);
    assert_eq!(stats.borrow().drains, 1);
}

#[test]
fn test_sleep_job_resumes_in_firing_tick() {
    let (board, mut event_loop, mut runtime, stats) = setup(1000);
    runtime.init(&mut event_loop, Some(b"sleep".as_slice())).unwrap();
    assert_eq!(runtime.engine().borrow().jobs.pending(), 1);

    for now in [1000, 1050] {
        board.set_time(now);
        event_loop.tick(RunMode::Infinite);
    }
    assert!(stats.borrow().log.is_empty());

    board.set_time(1051);
    event_loop.tick(RunMode::Infinite);

    assert_eq!(stats.borrow().log, vec!["woke"]);
    assert_eq!(runtime.engine().borrow().jobs.pending(), 0);
    assert_eq!(event_loop.handle_count(HandleType::Timer), 0);
}

#[test]
fn test_uncaught_error_resets_runtime() {
    let (board, mut event_loop, mut runtime, stats) = setup(0);

    let err = runtime
        .init(&mut event_loop, Some(b"blink then throw".as_slice()))
        .unwrap_err();

    assert!(matches!(err, ScriptError::Runtime(_)));
    assert_eq!(stats.borrow().inits, 2);
    assert_eq!(stats.borrow().cleanups, 1);
    assert_eq!(board.cleanups(), 1);
    assert_eq!(event_loop.handle_count(HandleType::Timer), 0);
    assert_eq!(event_loop.handle_count(HandleType::Idle), 1);
    assert!(runtime.idler().is_some());
}

#[test]
fn test_parse_error_is_reported_without_reset() {
    let (board, mut event_loop, mut runtime, stats) = setup(0);

    let err = runtime
        .init(&mut event_loop, Some(b"syntax error".as_slice()))
        .unwrap_err();

    assert!(matches!(err, ScriptError::Parse(_)));
    assert_eq!(stats.borrow().inits, 1);
    assert_eq!(stats.borrow().cleanups, 0);
    assert_eq!(board.cleanups(), 0);
}

#[test]
fn test_soft_reset_keeps_terminal() {
    let (board, mut event_loop, mut runtime, stats) = setup(0);

    let tty = event_loop.tty_init();
    event_loop.tty_read_start(tty, |_, _, _| {}).unwrap();
    runtime.init(&mut event_loop, Some(b"blink".as_slice())).unwrap();
    let old_idler = runtime.idler().unwrap();
    assert_eq!(event_loop.handle_count(HandleType::Timer), 1);

    runtime.soft_reset(&mut event_loop).unwrap();

    assert_eq!(event_loop.handle_count(HandleType::Timer), 0);
    assert_eq!(event_loop.handle_count(HandleType::Tty), 1);
    assert!(event_loop.handle(tty).is_some());
    assert!(event_loop.handle(old_idler).is_none());

    let idler = runtime.idler().expect("idler should be re-registered");
    assert!(event_loop.handle(idler).unwrap().is_active());
    assert_eq!(board.cleanups(), 1);
    assert_eq!(stats.borrow().inits, 2);

    event_loop.tick(RunMode::Infinite);
    assert_eq!(stats.borrow().drains, 1);
}

#[test]
fn test_stop_request_aborts_script() {
    let (_board, mut event_loop, mut runtime, _stats) = setup(0);
    runtime.init(&mut event_loop, None).unwrap();

    runtime.load(&mut event_loop, b"spin").unwrap();

    runtime.request_stop();
    assert!(runtime.vm_stop().is_requested());
    let err = runtime.load(&mut event_loop, b"spin").unwrap_err();

    assert!(matches!(err, ScriptError::Aborted));
    assert!(!runtime.vm_stop().is_requested(), "Taking the request clears it");
}

#[test]
fn test_vm_stop_take_clears_request() {
    let stop = VmStop::new();
    let shared = stop.clone();

    assert!(!stop.take());
    shared.request();
    assert!(stop.is_requested());
    assert!(stop.take());
    assert!(!shared.is_requested());
}

#[test]
fn test_job_spawns_follow_up_job() {
    let (_board, mut event_loop, mut runtime, stats) = setup(0);
    runtime.init(&mut event_loop, Some(b"chain".as_slice())).unwrap();
    assert!(stats.borrow().log.is_empty(), "Jobs only run from the idle phase");

    event_loop.tick(RunMode::Infinite);

    assert_eq!(stats.borrow().log, vec!["outer", "inner"]);
    assert_eq!(runtime.engine().borrow().jobs.pending(), 0);
}
