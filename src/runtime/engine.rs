use crate::error::ScriptError;
use crate::io::core::EventLoop;
use crate::runtime::VmStop;

/// The scripting engine driven by the firmware.
///
/// Only the narrow lifecycle the loop depends on is modelled here. Bindings that
/// expose timers, GPIO watches or UARTs to scripts register handles on the
/// [`EventLoop`] they are given and cancel them with `stop`/`handle_close`.
pub trait ScriptEngine {
    /// Brings up a fresh VM. `stop` is raised when the user asks to abort the
    /// running script; the engine should poll [`VmStop::take`] while executing.
    fn init(&mut self, event_loop: &mut EventLoop, stop: VmStop) -> Result<(), ScriptError>;

    /// Parses and runs a complete program.
    fn eval(&mut self, event_loop: &mut EventLoop, source: &[u8]) -> Result<(), ScriptError>;

    /// Runs every job (promise reaction, async continuation) currently enqueued.
    ///
    /// Called once per tick from the runtime's idle handle.
    fn run_enqueued_jobs(&mut self, event_loop: &mut EventLoop) -> Result<(), ScriptError>;

    /// Tears the VM down.
    fn cleanup(&mut self);
}
