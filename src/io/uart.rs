//! UART handles: poll a port's receive count and hand the bytes to a read callback.

use crate::board::Board;
use crate::error::Result;
use crate::io::core::EventLoop;
use crate::io::handle::{HandleId, HandleKey, HandleType, Payload};
use crate::io::tty::ReadCallback;

use log::trace;

/// Reports how many bytes are ready on a port without blocking.
pub type AvailableCallback = Box<dyn FnMut(&mut dyn Board, u8) -> usize>;

/// Payload of a UART handle.
pub struct Uart {
    pub(crate) port: u8,
    pub(crate) available_cb: Option<AvailableCallback>,
    pub(crate) read_cb: Option<ReadCallback>,
}

impl Uart {
    pub fn port(&self) -> u8 {
        self.port
    }

    fn available_slot(&mut self) -> &mut Option<AvailableCallback> {
        &mut self.available_cb
    }

    fn read_slot(&mut self) -> &mut Option<ReadCallback> {
        &mut self.read_cb
    }
}

impl EventLoop {
    pub fn uart_init(&mut self) -> HandleKey {
        self.init_handle(Payload::Uart(Uart {
            port: 0,
            available_cb: None,
            read_cb: None,
        }))
    }

    /// Starts reading `port`.
    ///
    /// Each tick `available_cb` is asked how many bytes are waiting; when it reports
    /// any, exactly that many are read from the board and passed to `read_cb`.
    pub fn uart_read_start<A, F>(
        &mut self,
        key: HandleKey,
        port: u8,
        available_cb: A,
        read_cb: F,
    ) -> Result<()>
    where
        A: FnMut(&mut dyn Board, u8) -> usize + 'static,
        F: FnMut(&mut EventLoop, HandleKey, &[u8]) + 'static,
    {
        self.start_handle::<Uart>(key, |uart| {
            uart.port = port;
            uart.available_cb = Some(Box::new(available_cb));
            uart.read_cb = Some(Box::new(read_cb));
        })
    }

    /// [`uart_read_start`](Self::uart_read_start) polling the board's own receive count.
    pub fn uart_read_start_default<F>(
        &mut self,
        key: HandleKey,
        port: u8,
        read_cb: F,
    ) -> Result<()>
    where
        F: FnMut(&mut EventLoop, HandleKey, &[u8]) + 'static,
    {
        self.uart_read_start(key, port, |board, port| board.uart_available(port), read_cb)
    }

    pub fn uart_read_stop(&mut self, key: HandleKey) -> Result<()> {
        self.stop_handle::<Uart>(key)
    }

    pub fn uart(&self, key: HandleKey) -> Option<&Uart> {
        self.payload::<Uart>(key)
    }

    pub fn uart_get_by_id(&self, id: HandleId) -> Option<HandleKey> {
        self.handle_get_by_id(id, HandleType::Uart)
    }

    pub fn uart_cleanup(&mut self) {
        self.cleanup_type(HandleType::Uart);
    }

    pub(crate) fn run_uarts(&mut self) {
        self.run_list(HandleType::Uart, |event_loop, key| {
            let active = event_loop.handle(key).is_some_and(|handle| handle.is_active());
            let port = match event_loop.payload::<Uart>(key) {
                Some(uart) if active && uart.available_cb.is_some() && uart.read_cb.is_some() => {
                    uart.port
                }
                _ => return,
            };

            let available = event_loop
                .dispatch::<Uart, _, _>(key, Uart::available_slot, |event_loop, available_cb| {
                    available_cb(event_loop.board.as_mut(), port)
                })
                .unwrap_or(0);
            if available == 0 {
                return;
            }

            let mut buf = vec![0u8; available];
            let len = event_loop.board.uart_read(port, &mut buf);
            buf.truncate(len);
            trace!("uart{port} delivered {len} bytes");

            event_loop.dispatch::<Uart, _, _>(key, Uart::read_slot, |event_loop, read_cb| {
                read_cb(event_loop, key, &buf)
            });
        });
    }
}
