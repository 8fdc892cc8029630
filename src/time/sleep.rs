use crate::error::Result;
use crate::io::core::EventLoop;

use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that completes when its one-shot loop timer fires.
///
/// The timer closes itself after firing. If the timer is freed before it fires (for
/// example by a soft reset) the future completes as well.
#[derive(Debug)]
pub struct Sleep {
    fired: oneshot::Receiver<()>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.fired).poll(cx).map(|_| ())
    }
}

/// Starts a timer of `ms` milliseconds on `event_loop` and returns a future tied to it.
///
/// The timer uses the loop's firing rule, so the future completes on the first tick
/// whose time is strictly past the deadline.
pub fn sleep(event_loop: &mut EventLoop, ms: u64) -> Result<Sleep> {
    let (tx, fired) = oneshot::channel();
    let mut tx = Some(tx);

    let timer = event_loop.timer_init();
    event_loop.timer_start(timer, ms, false, move |event_loop, key| {
        if let Some(tx) = tx.take() {
            let _ = tx.send(());
        }
        let _ = event_loop.handle_close(key);
    })?;

    Ok(Sleep { fired })
}
