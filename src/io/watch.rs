//! GPIO watch handles.
//!
//! Level-triggered watches fire on every tick while the pin holds the level. Edge
//! watches are debounced: any change of the reading restarts the stability window, and
//! an edge is only accepted once the reading has stayed put for `debounce_delay` ms.
//! A pin that keeps bouncing therefore never fires.

use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{Handle, HandleFlags, HandleId, HandleKey, HandleType, Payload};

use log::trace;

pub type WatchCallback = Box<dyn FnMut(&mut EventLoop, HandleKey)>;

/// Trigger condition of a watch. Edge modes are bits, so `Change == Rising | Falling`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchMode {
    LowLevel = 1,
    HighLevel = 2,
    Falling = 4,
    Rising = 8,
    Change = 12,
}

impl WatchMode {
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(WatchMode::LowLevel),
            2 => Some(WatchMode::HighLevel),
            4 => Some(WatchMode::Falling),
            8 => Some(WatchMode::Rising),
            12 => Some(WatchMode::Change),
            _ => None,
        }
    }

    /// True when this is a level mode and `reading` is that level.
    fn level_matches(self, reading: u8) -> bool {
        matches!(
            (self, reading),
            (WatchMode::LowLevel, 0) | (WatchMode::HighLevel, 1)
        )
    }

    /// Whether an accepted transition to `value` should be reported.
    fn edge_fires(self, value: u8) -> bool {
        match self {
            WatchMode::Change => true,
            WatchMode::Rising => value == 1,
            WatchMode::Falling => value == 0,
            WatchMode::LowLevel | WatchMode::HighLevel => false,
        }
    }
}

/// Payload of a GPIO watch handle.
pub struct Watch {
    pub(crate) callback: Option<WatchCallback>,
    pub(crate) pin: u8,
    pub(crate) mode: WatchMode,
    pub(crate) debounce_time: u64,
    pub(crate) debounce_delay: u32,
    pub(crate) last_val: u8,
    pub(crate) val: u8,
}

impl Watch {
    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    /// Last accepted (debounced) level.
    pub fn value(&self) -> u8 {
        self.val
    }

    /// Raw reading from the previous tick.
    pub fn last_value(&self) -> u8 {
        self.last_val
    }

    /// Time the pending transition was last seen to move, or 0 when none is pending.
    pub fn debounce_time(&self) -> u64 {
        self.debounce_time
    }

    pub fn debounce_delay(&self) -> u32 {
        self.debounce_delay
    }

    fn callback_slot(&mut self) -> &mut Option<WatchCallback> {
        &mut self.callback
    }

    /// Feeds one reading taken at `now` and reports whether the callback should run.
    fn observe(&mut self, reading: u8, now: u64) -> bool {
        if reading != self.last_val {
            self.debounce_time = now;
        }
        let elapsed = now.saturating_sub(self.debounce_time);

        let fire = if self.mode.level_matches(reading) {
            true
        } else if self.debounce_time > 0 && elapsed >= u64::from(self.debounce_delay) {
            let mut fire = false;
            if reading != self.val {
                self.val = reading;
                fire = self.mode.edge_fires(reading);
            }
            self.debounce_time = 0;
            fire
        } else {
            false
        };

        self.last_val = reading;
        fire
    }
}

impl EventLoop {
    pub fn watch_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Watch(Watch {
            callback: None,
            pin: 0,
            mode: WatchMode::Change,
            debounce_time: 0,
            debounce_delay: 0,
            last_val: 0,
            val: 0,
        }))
    }

    /// Starts watching `pin`.
    ///
    /// The pin is sampled right away so the first tick never reports a change that
    /// happened before the watch existed.
    ///
    /// # Arguments
    /// * `key` - Watch handle from [`watch_init`](Self::watch_init)
    /// * `pin` - GPIO number passed to [`Board::gpio_read`](crate::Board::gpio_read)
    /// * `mode` - Level or edge condition
    /// * `debounce` - Stability window for edge modes, in ms
    /// * `callback` - Invoked with the loop and the watch's key
    pub fn watch_start<F>(
        &mut self,
        key: HandleKey,
        pin: u8,
        mode: WatchMode,
        debounce: u32,
        callback: F,
    ) -> Result<()>
    where
        F: FnMut(&mut EventLoop, HandleKey) + 'static,
    {
        let last_val = self.board.gpio_read(pin);
        let val = self.board.gpio_read(pin);

        self.start_handle::<Watch>(key, |watch| {
            watch.callback = Some(Box::new(callback));
            watch.pin = pin;
            watch.mode = mode;
            watch.debounce_time = 0;
            watch.debounce_delay = debounce;
            watch.last_val = last_val;
            watch.val = val;
        })
    }

    pub fn watch_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Watch>(key)
    }

    pub fn watch(&self, key: HandleKey) -> Option<&Watch> {
        self.payload::<Watch>(key)
    }

    pub fn watch_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Watch)
    }

    pub fn watch_cleanup(&mut self) {
        self.cleanup_type(HandleType::Watch);
    }

    pub(crate) fn run_watches(&mut self) {
        self.run_list(HandleType::Watch, |event_loop, key| {
            let now = event_loop.now();
            let pin = match event_loop.handles.get(key) {
                Some(Handle {
                    flags,
                    payload: Payload::Watch(watch),
                    ..
                }) if flags.contains(HandleFlags::ACTIVE) => watch.pin,
                _ => return,
            };

            let reading = event_loop.board.gpio_read(pin);
            let Some(watch) = event_loop.payload_mut::<Watch>(key) else {
                return;
            };

            if watch.observe(reading, now) {
                trace!("watch on pin {pin} fired at {now}ms (reading {reading})");
                event_loop.dispatch::<Watch, _, _>(
                    key,
                    Watch::callback_slot,
                    |event_loop, callback| callback(event_loop, key),
                );
            }
        });
    }
}
