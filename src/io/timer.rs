//! Timer handles.
//!
//! A timer fires once its deadline is strictly behind the tick's virtual time. A
//! repeating timer advances its deadline by exactly one interval per firing, so
//! deadlines stay on the grid laid out by the start time no matter how late the
//! ticks arrive, and a late timer fires once per tick rather than catching up in a
//! burst.

use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{Handle, HandleFlags, HandleId, HandleKey, HandleType, Payload};

use log::trace;

pub type TimerCallback = Box<dyn FnMut(&mut EventLoop, HandleKey)>;

/// Payload of a timer handle.
pub struct Timer {
    pub(crate) callback: Option<TimerCallback>,
    pub(crate) clamped_timeout: u64,
    pub(crate) interval: u64,
    pub(crate) repeat: bool,
    pub(crate) tag: u32,
}

impl Timer {
    /// Absolute virtual time (ms) after which the timer fires next.
    pub fn deadline(&self) -> u64 {
        self.clamped_timeout
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Caller-defined bookkeeping value.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    fn callback_slot(&mut self) -> &mut Option<TimerCallback> {
        &mut self.callback
    }
}

impl EventLoop {
    pub fn timer_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Timer(Timer {
            callback: None,
            clamped_timeout: 0,
            interval: 0,
            repeat: false,
            tag: 0,
        }))
    }

    /// Arms the timer to fire `interval` ms after the current tick's time.
    ///
    /// Deadlines saturate at `u64::MAX`, which never fires.
    ///
    /// # Arguments
    /// * `key` - Timer handle from [`timer_init`](Self::timer_init)
    /// * `interval` - Delay before the first firing and, if `repeat`, between firings
    /// * `repeat` - Re-arm after every firing instead of going inactive
    /// * `callback` - Invoked with the loop and the timer's key
    pub fn timer_start<F>(
        &mut self,
        key: HandleKey,
        interval: u64,
        repeat: bool,
        callback: F,
    ) -> Result<()>
    where
        F: FnMut(&mut EventLoop, HandleKey) + 'static,
    {
        let now = self.now();
        self.start_handle::<Timer>(key, |timer| {
            timer.callback = Some(Box::new(callback));
            timer.clamped_timeout = now.saturating_add(interval);
            timer.interval = interval;
            timer.repeat = repeat;
        })
    }

    pub fn timer_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Timer>(key)
    }

    pub fn timer_set_tag(&mut self, key: HandleKey, tag: u32) {
        if let Some(timer) = self.payload_mut::<Timer>(key) {
            timer.tag = tag;
        }
    }

    pub fn timer(&self, key: HandleKey) -> Option<&Timer> {
        self.payload::<Timer>(key)
    }

    pub fn timer_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Timer)
    }

    pub fn timer_cleanup(&mut self) {
        self.cleanup_type(HandleType::Timer);
    }

    pub(crate) fn run_timers(&mut self) {
        self.run_list(HandleType::Timer, |event_loop, key| {
            let now = event_loop.now();
            let Some(Handle {
                id,
                flags,
                payload: Payload::Timer(timer),
                ..
            }) = event_loop.handles.get_mut(key)
            else {
                return;
            };

            if !flags.contains(HandleFlags::ACTIVE) || timer.clamped_timeout >= now {
                return;
            }

            if timer.repeat {
                timer.clamped_timeout = timer.clamped_timeout.saturating_add(timer.interval);
            } else {
                // Stays linked but inert until stopped or closed.
                flags.remove(HandleFlags::ACTIVE);
            }
            trace!("timer #{id} fired at {now}ms");

            event_loop.dispatch::<Timer, _, _>(
                key,
                Timer::callback_slot,
                |event_loop, callback| callback(event_loop, key),
            );
        });
    }
}
