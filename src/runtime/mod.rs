//! Script runtime glue.
//!
//! Connects a [`ScriptEngine`] to the [`EventLoop`]:
//! - registers the idle handle that drains the engine's job queue once per tick
//! - loads the stored program, recovering from scripts that throw at top level
//! - performs soft resets, which tear down every script-owned handle while the
//!   terminal connection (TTY handles) survives
//! - exposes the [`VmStop`] flag used to abort a running script
//!
//! # Example
//!
//! ```ignore
//! use tickloop::{EventLoop, RunMode, SimBoard};
//! use tickloop::runtime::Runtime;
//!
//! let mut event_loop = EventLoop::new(SimBoard::new());
//! let mut runtime = Runtime::new(MyEngine::default());
//! runtime.init(&mut event_loop, Some(b"print(1)".as_slice()))?;
//! event_loop.run(RunMode::Infinite);
//! ```

mod engine;
mod jobs;

pub use engine::ScriptEngine;
pub use jobs::JobQueue;

use crate::error::{Result, ScriptError};
use crate::io::core::EventLoop;
use crate::io::handle::HandleKey;

use log::{debug, error, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared abort request for the running script.
///
/// Raised from outside the engine (typically the REPL on Ctrl-C) and polled by the
/// engine while it executes.
#[derive(Clone, Debug, Default)]
pub struct VmStop(Rc<Cell<bool>>);

impl VmStop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    /// Returns whether a stop was requested and clears the request.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

pub struct Runtime<E> {
    engine: Rc<RefCell<E>>,
    idler: Option<HandleKey>,
    vm_stop: VmStop,
}

impl<E: ScriptEngine + 'static> Runtime<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Rc::new(RefCell::new(engine)),
            idler: None,
            vm_stop: VmStop::new(),
        }
    }

    pub fn engine(&self) -> &Rc<RefCell<E>> {
        &self.engine
    }

    pub fn vm_stop(&self) -> VmStop {
        self.vm_stop.clone()
    }

    /// Asks the engine to abort the script it is running.
    pub fn request_stop(&self) {
        self.vm_stop.request();
    }

    /// Key of the idle handle draining the job queue, once registered.
    pub fn idler(&self) -> Option<HandleKey> {
        self.idler
    }

    /// Initialises the engine, registers the job-drain idle handle and, if given,
    /// runs `program`.
    ///
    /// # Errors
    /// Engine initialisation failures, and any error from [`load`](Self::load).
    pub fn init(
        &mut self,
        event_loop: &mut EventLoop,
        program: Option<&[u8]>,
    ) -> std::result::Result<(), ScriptError> {
        self.engine
            .borrow_mut()
            .init(event_loop, self.vm_stop.clone())?;
        self.ensure_idler(event_loop)?;

        if let Some(program) = program {
            self.load(event_loop, program)?;
        }
        Ok(())
    }

    fn ensure_idler(&mut self, event_loop: &mut EventLoop) -> Result<()> {
        if let Some(key) = self.idler {
            match event_loop.handle(key) {
                Some(handle) if handle.is_active() => return Ok(()),
                Some(handle) if !handle.is_closing() => event_loop.handle_close(key)?,
                _ => {}
            }
        }

        let key = event_loop.idle_init();
        let engine = Rc::clone(&self.engine);
        event_loop.idle_start(key, move |event_loop, _| {
            let Ok(mut engine) = engine.try_borrow_mut() else {
                warn!("script engine busy, skipping job drain");
                return;
            };
            if let Err(err) = engine.run_enqueued_jobs(event_loop) {
                error!("{err}");
            }
        })?;

        self.idler = Some(key);
        Ok(())
    }

    /// Parses and runs `program`.
    ///
    /// A parse error is reported and returned. If the program throws, the runtime is
    /// reset so the board stays usable, then the error is returned.
    pub fn load(
        &mut self,
        event_loop: &mut EventLoop,
        program: &[u8],
    ) -> std::result::Result<(), ScriptError> {
        let result = self.engine.borrow_mut().eval(event_loop, program);

        match result {
            Ok(()) => Ok(()),
            Err(err @ ScriptError::Parse(_)) => {
                error!("{err}");
                Err(err)
            }
            Err(err) => {
                error!("{err}");
                self.cleanup(event_loop);
                self.init(event_loop, None)?;
                Err(err)
            }
        }
    }

    /// Tears down the engine, resets peripherals and frees every non-TTY handle.
    pub fn cleanup(&mut self, event_loop: &mut EventLoop) {
        self.engine.borrow_mut().cleanup();
        event_loop.board_mut().cleanup();
        event_loop.cleanup();
        self.idler = None;

        debug!("runtime cleaned up");
    }

    /// Restarts the engine without running the stored program.
    pub fn soft_reset(
        &mut self,
        event_loop: &mut EventLoop,
    ) -> std::result::Result<(), ScriptError> {
        self.cleanup(event_loop);
        self.init(event_loop, None)?;

        debug!("soft reset");
        Ok(())
    }
}
