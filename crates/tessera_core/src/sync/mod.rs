//! # Synchronization Primitives
//!
//! Snapshots that let readers work on a frozen copy of a store while
//! writers keep mutating the live one.

pub mod shadow;

pub use shadow::Shadow;
