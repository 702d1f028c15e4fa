#![deny(missing_docs)]

//! Kodiak SDK - Complete SDK.
//!
//! Re-exports all Kodiak SDK components for convenient single-crate usage.

pub use kodiak_primitives as primitives;
pub use kodiak_keychain as keychain;
pub use kodiak_platform as platform;
