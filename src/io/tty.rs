//! TTY handles: deliver bytes pending on the board's terminal to a read callback.

use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{HandleId, HandleKey, HandleType, Payload};

use log::trace;

/// Receives the bytes read during one tick.
pub type ReadCallback = Box<dyn FnMut(&mut EventLoop, HandleKey, &[u8])>;

/// Payload of a TTY handle.
pub struct Tty {
    pub(crate) read_cb: Option<ReadCallback>,
}

impl Tty {
    fn read_slot(&mut self) -> &mut Option<ReadCallback> {
        &mut self.read_cb
    }
}

impl EventLoop {
    pub fn tty_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Tty(Tty { read_cb: None }))
    }

    pub fn tty_read_start<F>(&mut self, key: HandleKey, read_cb: F) -> Result<()>
    where
        F: FnMut(&mut EventLoop, HandleKey, &[u8]) + 'static,
    {
        self.start_handle::<Tty>(key, |tty| tty.read_cb = Some(Box::new(read_cb)))
    }

    pub fn tty_read_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Tty>(key)
    }

    pub fn tty_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Tty)
    }

    pub fn tty_cleanup(&mut self) {
        self.cleanup_type(HandleType::Tty);
    }

    pub(crate) fn run_ttys(&mut self) {
        self.run_list(HandleType::Tty, |event_loop, key| {
            let ready = event_loop
                .handle(key)
                .is_some_and(|handle| handle.is_active())
                && event_loop
                    .payload::<Tty>(key)
                    .is_some_and(|tty| tty.read_cb.is_some());
            if !ready {
                return;
            }

            let available = event_loop.board.tty_available();
            if available == 0 {
                return;
            }

            let mut buf = vec![0u8; available];
            let len = event_loop.board.tty_read(&mut buf);
            buf.truncate(len);
            trace!("tty delivered {len} bytes");

            event_loop.dispatch::<Tty, _, _>(key, Tty::read_slot, |event_loop, read_cb| {
                read_cb(event_loop, key, &buf)
            });
        });
    }
}
