use crate::board::Board;
use crate::builder::EventLoopBuilder;
use crate::error::{Error, Result};
use crate::io::handle::{
    CloseCallback, Handle, HandleFlags, HandleId, HandleKey, HandleType, Kind, Membership,
    Payload,
};
use crate::utils::list::List;
use crate::utils::slab::Slab;

use log::{debug, trace};

pub(crate) const DEFAULT_CAPACITY: usize = 16;

/// Termination policy of [`EventLoop::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Stop once no timer, watch or UART handle is registered and nothing is closing.
    /// Idle and TTY handles do not keep the loop alive.
    #[default]
    Quiescent,
    /// Keep ticking until [`EventLoop::stop`] is called.
    Infinite,
}

/// Single-threaded cooperative event loop.
///
/// Every tick refreshes the virtual clock from the [`Board`] once, then runs each
/// handle kind in a fixed order, reaps closed handles and finally runs the board's
/// custom hook:
///
/// `update_time → timers → ttys → watches → uarts → idles → reap → custom hook`
///
/// Within a kind, handles are visited in registration order. Callbacks receive the
/// loop itself and may start, stop or close any handle, including their own.
///
/// # Example
/// ```ignore
/// use tickloop::{EventLoop, RunMode, SimBoard};
///
/// let board = SimBoard::new();
/// let mut event_loop = EventLoop::new(board.clone());
///
/// let timer = event_loop.timer_init();
/// event_loop.timer_start(timer, 100, false, |_, _| println!("fired"))?;
/// event_loop.run(RunMode::Infinite);
/// ```
pub struct EventLoop {
    stop_flag: bool,
    time: u64,
    pass: u64,
    pub(crate) board: Box<dyn Board>,
    pub(crate) handles: Slab<Handle>,
    lists: [List; 6],
    closing: List,
}

impl EventLoop {
    /// Creates a loop with the default configuration driven by `board`.
    pub fn new(board: impl Board + 'static) -> Self {
        Self::from_parts(Box::new(board), DEFAULT_CAPACITY)
    }

    /// Returns a builder for a custom-configured loop.
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::new()
    }

    pub(crate) fn from_parts(board: Box<dyn Board>, capacity: usize) -> Self {
        let mut event_loop = Self {
            stop_flag: false,
            time: 0,
            pass: 0,
            board,
            handles: Slab::new(capacity),
            lists: Default::default(),
            closing: List::new(),
        };
        event_loop.update_time();
        event_loop
    }

    /// Virtual time of the current (or last) tick, in milliseconds.
    pub fn now(&self) -> u64 {
        self.time
    }

    pub fn board_mut(&mut self) -> &mut dyn Board {
        self.board.as_mut()
    }

    /// Requests the loop to stop at the end of the current tick.
    pub fn stop(&mut self) {
        self.stop_flag = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag
    }

    /// Whether any handle still keeps a [`RunMode::Quiescent`] loop running.
    pub fn is_alive(&self) -> bool {
        !(self.lists[HandleType::Timer.index()].is_empty()
            && self.lists[HandleType::Watch.index()].is_empty()
            && self.lists[HandleType::Uart.index()].is_empty()
            && self.closing.is_empty())
    }

    /// Ticks until the loop is stopped.
    pub fn run(&mut self, mode: RunMode) {
        while !self.stop_flag {
            self.tick(mode);
        }
    }

    /// Runs exactly one pass over every phase.
    pub fn tick(&mut self, mode: RunMode) {
        self.update_time();
        trace!("tick at {}ms", self.time);

        self.run_timers();
        self.run_ttys();
        self.run_watches();
        self.run_uarts();
        self.run_idles();
        self.reap_closing();
        self.board.custom_tick();

        if mode == RunMode::Quiescent && !self.is_alive() {
            debug!("no pending handles, stopping loop");
            self.stop_flag = true;
        }
    }

    fn update_time(&mut self) {
        self.time = self.board.now_ms();
    }

    /// Looks up a handle by key. Returns `None` once the handle has been freed.
    pub fn handle(&self, key: HandleKey) -> Option<&Handle> {
        self.handles.get(key)
    }

    /// Number of handles currently linked into the list of `handle_type`.
    pub fn handle_count(&self, handle_type: HandleType) -> usize {
        self.lists[handle_type.index()].len()
    }

    /// Number of handles waiting for the reap phase.
    pub fn closing_count(&self) -> usize {
        self.closing.len()
    }

    /// Linear search of the `handle_type` list for the handle with `id`.
    pub fn handle_get_by_id(&self, id: HandleId, handle_type: HandleType) -> Option<HandleKey> {
        self.lists[handle_type.index()]
            .iter(&self.handles)
            .find(|key| self.handles.get(*key).is_some_and(|handle| handle.id == id))
    }

    /// Schedules a handle for destruction.
    ///
    /// The handle is unlinked from its kind list right away, so it is never visited by
    /// a `run` pass again, and is freed during the next reap phase. Its key stays valid
    /// until then.
    pub fn handle_close(&mut self, key: HandleKey) -> Result<()> {
        self.close_handle(key, None)
    }

    /// Like [`handle_close`](Self::handle_close), invoking `close_cb` once the handle
    /// has been reaped.
    pub fn handle_close_with<F>(&mut self, key: HandleKey, close_cb: F) -> Result<()>
    where
        F: FnOnce(&mut EventLoop, HandleId) + 'static,
    {
        self.close_handle(key, Some(Box::new(close_cb)))
    }

    fn close_handle(&mut self, key: HandleKey, close_cb: Option<CloseCallback>) -> Result<()> {
        let handle = self.handles.get(key).ok_or(Error::InvalidHandle(key))?;
        if handle.is_closing() {
            return Err(Error::Closing(handle.id));
        }
        let (id, handle_type) = (handle.id, handle.handle_type);

        self.unlink(key);

        let Self {
            handles, closing, ..
        } = self;
        if let Some(handle) = handles.get_mut(key) {
            handle.flags.remove(HandleFlags::ACTIVE);
            handle.flags.insert(HandleFlags::CLOSING);
            handle.close_cb = close_cb;
            handle.membership = Membership::Closing;
        }
        closing.append(handles, key);

        debug!("closing {handle_type} handle #{id}");
        Ok(())
    }

    fn reap_closing(&mut self) {
        while let Some(key) = self.closing.head() {
            self.unlink(key);
            let Some(handle) = self.handles.remove(key) else {
                continue;
            };

            debug!("reaped {} handle #{}", handle.handle_type, handle.id);
            if let Some(close_cb) = handle.close_cb {
                close_cb(self, handle.id);
            }
        }
    }

    /// Frees every timer, watch, UART, idle and stream handle.
    ///
    /// TTY handles survive so the terminal connection outlives a script reset.
    pub fn cleanup(&mut self) {
        for handle_type in HandleType::ALL {
            if handle_type != HandleType::Tty {
                self.cleanup_type(handle_type);
            }
        }
    }

    /// Frees all handles of one kind, linked or not, without running close callbacks.
    pub(crate) fn cleanup_type(&mut self, handle_type: HandleType) {
        let doomed: Vec<HandleKey> = self
            .handles
            .keys()
            .filter(|key| {
                self.handles
                    .get(*key)
                    .is_some_and(|handle| handle.handle_type == handle_type)
            })
            .collect();

        for key in &doomed {
            self.unlink(*key);
            self.handles.remove(*key);
        }

        if !doomed.is_empty() {
            debug!("freed {} {handle_type} handles", doomed.len());
        }
    }

    /* generic handle manager */

    pub(crate) fn init_handle(&mut self, payload: Payload) -> HandleKey {
        let handle = Handle::new(payload);
        let (id, handle_type) = (handle.id, handle.handle_type);
        let key = self.handles.insert(handle);

        trace!(
            "initialised {handle_type} handle #{id} at {key} ({} live)",
            self.handles.len()
        );
        key
    }

    fn checked_mut<K: Kind>(&mut self, key: HandleKey) -> Result<&mut Handle> {
        let handle = self.handles.get_mut(key).ok_or(Error::InvalidHandle(key))?;
        if handle.handle_type != K::TYPE {
            return Err(Error::WrongType {
                key,
                expected: K::TYPE,
                found: handle.handle_type,
            });
        }
        Ok(handle)
    }

    /// Configures the payload, sets ACTIVE and links the handle at the tail of its
    /// kind list. Restarting an already linked handle keeps its list position.
    pub(crate) fn start_handle<K: Kind>(
        &mut self,
        key: HandleKey,
        configure: impl FnOnce(&mut K),
    ) -> Result<()> {
        let handle = self.checked_mut::<K>(key)?;
        if handle.is_closing() {
            return Err(Error::Closing(handle.id));
        }
        if let Some(payload) = K::from_payload_mut(&mut handle.payload) {
            configure(payload);
        }
        handle.flags.insert(HandleFlags::ACTIVE);

        let id = handle.id;
        if handle.membership == Membership::Unlinked {
            let Self { handles, lists, .. } = self;
            lists[K::TYPE.index()].append(handles, key);
            if let Some(handle) = handles.get_mut(key) {
                handle.membership = Membership::Live;
            }
        }

        debug!("started {} handle #{id}", K::TYPE);
        Ok(())
    }

    /// Clears ACTIVE and unlinks the handle from its kind list. Stopping a handle that
    /// is not linked (never started, already stopped or closing) does nothing.
    pub(crate) fn stop_handle<K: Kind>(&mut self, key: HandleKey) -> Result<()> {
        let handle = self.checked_mut::<K>(key)?;
        handle.flags.remove(HandleFlags::ACTIVE);

        if handle.membership == Membership::Live {
            let id = handle.id;
            self.unlink(key);
            debug!("stopped {} handle #{id}", K::TYPE);
        }
        Ok(())
    }

    fn unlink(&mut self, key: HandleKey) {
        let Self {
            handles,
            lists,
            closing,
            ..
        } = self;
        let Some((membership, handle_type)) = handles
            .get(key)
            .map(|handle| (handle.membership, handle.handle_type))
        else {
            return;
        };

        match membership {
            Membership::Live => lists[handle_type.index()].remove(handles, key),
            Membership::Closing => closing.remove(handles, key),
            Membership::Unlinked => return,
        }

        if let Some(handle) = handles.get_mut(key) {
            handle.membership = Membership::Unlinked;
        }
    }

    fn is_live(&self, key: HandleKey) -> bool {
        self.handles
            .get(key)
            .is_some_and(|handle| handle.membership == Membership::Live)
    }

    pub(crate) fn payload<K: Kind>(&self, key: HandleKey) -> Option<&K> {
        self.handles
            .get(key)
            .and_then(|handle| K::from_payload(&handle.payload))
    }

    pub(crate) fn payload_mut<K: Kind>(&mut self, key: HandleKey) -> Option<&mut K> {
        self.handles
            .get_mut(key)
            .and_then(|handle| K::from_payload_mut(&mut handle.payload))
    }

    /// Visits the `handle_type` list in order, each handle at most once per pass.
    ///
    /// The successor is captured before `visit` runs, so `visit` may unlink or close the
    /// handle it was given. If it also unlinks that successor, the walk continues from
    /// the visited handle's current successor when it is still linked, otherwise from
    /// the first handle of the list this pass has not visited yet.
    pub(crate) fn run_list(
        &mut self,
        handle_type: HandleType,
        mut visit: impl FnMut(&mut Self, HandleKey),
    ) {
        self.pass = self.pass.wrapping_add(1);
        let pass = self.pass;
        let mut cursor = self.lists[handle_type.index()].head();

        while let Some(key) = cursor {
            let next = self.handles.get(key).and_then(|handle| handle.link.next);

            if self.mark_visited(key, pass) {
                visit(self, key);
            }

            cursor = match next {
                Some(next) if self.is_live(next) => Some(next),
                Some(_) if self.is_live(key) => {
                    self.handles.get(key).and_then(|handle| handle.link.next)
                }
                Some(_) => {
                    trace!("{handle_type} pass lost its successor at {key}, rescanning");
                    self.first_unvisited(handle_type, pass)
                }
                None => None,
            };
        }
    }

    /// Stamps `key` with `pass`. Returns false if it already carried it.
    fn mark_visited(&mut self, key: HandleKey, pass: u64) -> bool {
        match self.handles.get_mut(key) {
            Some(handle) if handle.pass != pass => {
                handle.pass = pass;
                true
            }
            _ => false,
        }
    }

    fn first_unvisited(&self, handle_type: HandleType, pass: u64) -> Option<HandleKey> {
        self.lists[handle_type.index()]
            .iter(&self.handles)
            .find(|key| self.handles.get(*key).is_some_and(|handle| handle.pass != pass))
    }

    /// Takes the callback selected by `slot` out of the handle, invokes it with the loop
    /// and puts it back, unless the handle was freed or given a new callback meanwhile.
    pub(crate) fn dispatch<K: Kind, C, R>(
        &mut self,
        key: HandleKey,
        slot: fn(&mut K) -> &mut Option<C>,
        invoke: impl FnOnce(&mut Self, &mut C) -> R,
    ) -> Option<R> {
        let mut callback = self
            .payload_mut::<K>(key)
            .and_then(|payload| slot(payload).take())?;

        let result = invoke(self, &mut callback);

        if let Some(payload) = self.payload_mut::<K>(key) {
            let current = slot(payload);
            if current.is_none() {
                *current = Some(callback);
            }
        }

        Some(result)
    }
}
