//! Containers shared by the handle managers.

pub(crate) mod list;
pub(crate) mod slab;
