//! Handle base type shared by every event source.
//!
//! A [`Handle`] is a header (identity, kind, lifecycle flags, pending close callback,
//! list link) plus a kind-specific payload. Handles are stored in the loop's arena and
//! addressed by [`HandleKey`]; [`HandleId`] is the externally visible identity.

use crate::io::core::EventLoop;
use crate::io::idle::Idle;
use crate::io::stream::Stream;
use crate::io::timer::Timer;
use crate::io::tty::Tty;
use crate::io::uart::Uart;
use crate::io::watch::Watch;
use crate::utils::list::{Link, Linked};

use bitflags::bitflags;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Arena address of a handle.
pub use crate::utils::slab::Key as HandleKey;

/// Invoked once a closed handle has been reaped. Receives the id of the freed handle.
pub type CloseCallback = Box<dyn FnOnce(&mut EventLoop, HandleId)>;

static NEXT_HANDLE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique handle identity.
///
/// Ids increase monotonically across every loop in the process and are never reused
/// (the counter wraps only after 2^32 handles).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(u32);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<HandleId> for u32 {
    fn from(id: HandleId) -> u32 {
        id.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleType {
    Timer,
    Tty,
    Watch,
    Uart,
    Idle,
    Stream,
}

impl HandleType {
    pub(crate) const ALL: [HandleType; 6] = [
        HandleType::Timer,
        HandleType::Tty,
        HandleType::Watch,
        HandleType::Uart,
        HandleType::Idle,
        HandleType::Stream,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HandleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleType::Timer => "timer",
            HandleType::Tty => "tty",
            HandleType::Watch => "watch",
            HandleType::Uart => "uart",
            HandleType::Idle => "idle",
            HandleType::Stream => "stream",
        };
        f.write_str(name)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct HandleFlags: u8 {
        const ACTIVE = 0x01;
        const CLOSING = 0x02;
    }
}

/// Which list a handle is currently threaded on. A handle is on at most one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Membership {
    Unlinked,
    Live,
    Closing,
}

pub(crate) enum Payload {
    Timer(Timer),
    Tty(Tty),
    Watch(Watch),
    Uart(Uart),
    Idle(Idle),
    Stream(Stream),
}

impl Payload {
    fn handle_type(&self) -> HandleType {
        match self {
            Payload::Timer(_) => HandleType::Timer,
            Payload::Tty(_) => HandleType::Tty,
            Payload::Watch(_) => HandleType::Watch,
            Payload::Uart(_) => HandleType::Uart,
            Payload::Idle(_) => HandleType::Idle,
            Payload::Stream(_) => HandleType::Stream,
        }
    }
}

/// A registered event source.
pub struct Handle {
    pub(crate) id: HandleId,
    pub(crate) handle_type: HandleType,
    pub(crate) flags: HandleFlags,
    pub(crate) close_cb: Option<CloseCallback>,
    pub(crate) link: Link,
    pub(crate) membership: Membership,
    /// Last run pass that visited this handle.
    pub(crate) pass: u64,
    pub(crate) payload: Payload,
}

impl Handle {
    /// Creates an inactive, unlinked handle with a fresh id.
    pub(crate) fn new(payload: Payload) -> Self {
        Self {
            id: HandleId::next(),
            handle_type: payload.handle_type(),
            flags: HandleFlags::empty(),
            close_cb: None,
            link: Link::default(),
            membership: Membership::Unlinked,
            pass: 0,
            payload,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn handle_type(&self) -> HandleType {
        self.handle_type
    }

    pub fn flags(&self) -> HandleFlags {
        self.flags
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(HandleFlags::ACTIVE)
    }

    pub fn is_closing(&self) -> bool {
        self.flags.contains(HandleFlags::CLOSING)
    }

    pub fn as_timer(&self) -> Option<&Timer> {
        Timer::from_payload(&self.payload)
    }

    pub fn as_watch(&self) -> Option<&Watch> {
        Watch::from_payload(&self.payload)
    }

    pub fn as_uart(&self) -> Option<&Uart> {
        Uart::from_payload(&self.payload)
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        Stream::from_payload(&self.payload)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("type", &self.handle_type)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Linked for Handle {
    fn link(&self) -> &Link {
        &self.link
    }

    fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }
}

/// Per-kind payload stored inside a [`Handle`].
///
/// Lets the generic manager operations in [`EventLoop`] reach the payload of one kind
/// without matching on every variant.
pub(crate) trait Kind: Sized + 'static {
    const TYPE: HandleType;

    fn from_payload(payload: &Payload) -> Option<&Self>;
    fn from_payload_mut(payload: &mut Payload) -> Option<&mut Self>;
}

macro_rules! impl_kind {
    ($kind:ident) => {
        impl Kind for $kind {
            const TYPE: HandleType = HandleType::$kind;

            fn from_payload(payload: &Payload) -> Option<&Self> {
                match payload {
                    Payload::$kind(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_payload_mut(payload: &mut Payload) -> Option<&mut Self> {
                match payload {
                    Payload::$kind(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_kind!(Timer);
impl_kind!(Tty);
impl_kind!(Watch);
impl_kind!(Uart);
impl_kind!(Idle);
impl_kind!(Stream);
