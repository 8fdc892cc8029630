//! Stream handles.
//!
//! Streams are registered and tracked like the other kinds, but no tick phase polls
//! them: the loop never calls their callbacks and they do not keep a
//! [`RunMode::Quiescent`](crate::RunMode::Quiescent) loop alive.

use crate::board::Board;
use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{HandleId, HandleKey, HandleType, Payload};
use crate::io::tty::ReadCallback;

pub type StreamAvailableCallback = Box<dyn FnMut(&mut dyn Board) -> usize>;

/// Payload of a stream handle.
pub struct Stream {
    pub(crate) blocking: bool,
    pub(crate) available_cb: Option<StreamAvailableCallback>,
    pub(crate) read_cb: Option<ReadCallback>,
}

impl Stream {
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn has_callbacks(&self) -> bool {
        self.available_cb.is_some() && self.read_cb.is_some()
    }
}

impl EventLoop {
    pub fn stream_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Stream(Stream {
            blocking: false,
            available_cb: None,
            read_cb: None,
        }))
    }

    pub fn stream_set_blocking(&mut self, key: HandleKey, blocking: bool) {
        if let Some(stream) = self.payload_mut::<Stream>(key) {
            stream.blocking = blocking;
        }
    }

    /// Registers the stream's callbacks and switches it to non-blocking.
    pub fn stream_read_start<A, F>(
        &mut self,
        key: HandleKey,
        available_cb: A,
        read_cb: F,
    ) -> Result<()>
    where
        A: FnMut(&mut dyn Board) -> usize + 'static,
        F: FnMut(&mut EventLoop, HandleKey, &[u8]) + 'static,
    {
        self.start_handle::<Stream>(key, |stream| {
            stream.blocking = false;
            stream.available_cb = Some(Box::new(available_cb));
            stream.read_cb = Some(Box::new(read_cb));
        })
    }

    pub fn stream_read_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Stream>(key)
    }

    pub fn stream(&self, key: HandleKey) -> Option<&Stream> {
        self.payload::<Stream>(key)
    }

    pub fn stream_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Stream)
    }

    pub fn stream_cleanup(&mut self) {
        self.cleanup_type(HandleType::Stream);
    }
}
