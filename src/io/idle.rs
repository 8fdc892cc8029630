//! Idle handles: run once per tick, after every I/O kind and before the reap phase.

use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{HandleId, HandleKey, HandleType, Payload};

pub type IdleCallback = Box<dyn FnMut(&mut EventLoop, HandleKey)>;

/// Payload of an idle handle.
pub struct Idle {
    pub(crate) callback: Option<IdleCallback>,
}

impl Idle {
    fn callback_slot(&mut self) -> &mut Option<IdleCallback> {
        &mut self.callback
    }
}

impl EventLoop {
    pub fn idle_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Idle(Idle { callback: None }))
    }

    pub fn idle_start<F>(&mut self, key: HandleKey, callback: F) -> Result<()>
    where
        F: FnMut(&mut EventLoop, HandleKey) + 'static,
    {
        self.start_handle::<Idle>(key, |idle| idle.callback = Some(Box::new(callback)))
    }

    pub fn idle_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Idle>(key)
    }

    pub fn idle_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Idle)
    }

    pub fn idle_cleanup(&mut self) {
        self.cleanup_type(HandleType::Idle);
    }

    pub(crate) fn run_idles(&mut self) {
        self.run_list(HandleType::Idle, |event_loop, key| {
            if !event_loop.handle(key).is_some_and(|handle| handle.is_active()) {
                return;
            }
            event_loop.dispatch::<Idle, _, _>(key, Idle::callback_slot, |event_loop, callback| {
                callback(event_loop, key)
            });
        });
    }
}
