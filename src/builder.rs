//! Fluent builder for EventLoop construction.
//!
//! Provides a builder pattern interface for creating and configuring EventLoop instances.

use crate::board::Board;
use crate::error::BuildError;
use crate::io::core::{DEFAULT_CAPACITY, EventLoop};

/// Builder for constructing EventLoop instances with fluent API.
///
/// # Example
/// ```ignore
/// let event_loop = EventLoopBuilder::new()
///     .board(SimBoard::new())
///     .capacity(64)
///     .build()?;
/// ```
pub struct EventLoopBuilder {
    board: Option<Box<dyn Board>>,
    capacity: usize,
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoopBuilder {
    /// Creates a new event loop builder with no board and the default capacity.
    pub fn new() -> Self {
        Self {
            board: None,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Sets the board supplying time and hardware input to the loop.
    pub fn board(mut self, board: impl Board + 'static) -> Self {
        self.board = Some(Box::new(board));
        self
    }

    /// Number of handle slots reserved up front. The arena still grows on demand.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds and returns a configured EventLoop instance.
    ///
    /// The loop's clock is read once here, so handles started before the first tick
    /// measure from the time the loop was built.
    ///
    /// # Errors
    /// [`BuildError::NoBoard`] if no board was provided.
    pub fn build(self) -> Result<EventLoop, BuildError> {
        let board = self.board.ok_or(BuildError::NoBoard)?;
        Ok(EventLoop::from_parts(board, self.capacity))
    }
}
