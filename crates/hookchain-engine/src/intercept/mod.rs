//! Explicit wrapping factory.
//!
//! [`Hooked`] puts a hook registry in front of a target's named
//! operations; [`declare_hooks`] records per-type registrations applied to
//! every wrapper built for that type; [`InstanceStore`] keeps wrapped
//! instances' registries addressable by id.

pub mod declarations;
pub mod hooked;
pub mod store;

pub use declarations::{apply_declarations, clear_declarations, declare_hooks};
pub use hooked::{Hooked, HookedBuilder};
pub use store::InstanceStore;
