//! Host tree abstraction for Tether.
//!
//! This crate provides the [`HostTree`] trait, the seam between the lifecycle
//! manager and whatever hierarchical document it runs against. This enables:
//!
//! - **Unit testing** against an in-memory tree
//! - **Backend flexibility** (in-memory documents, browser DOM bindings, parsed markup)
//! - **Clean separation** between binding logic and tree internals
//!
//! # Architecture
//!
//! The crate provides:
//! - [`HostTree`] trait: selector matching, subtree queries, mutation
//!   subscriptions and per-node extension slots
//! - [`MutationRecord`] and [`ObserveOptions`] describing the change stream
//! - [`StorageKey`] tokens addressing per-node slots
//!
//! The `tether-dom` crate ships an in-memory implementation.

mod key;
mod mutation;
mod tree;

pub use key::{Slot, StorageKey};
pub use mutation::{MutationCallback, MutationKind, MutationRecord, ObserveOptions};
pub use tree::HostTree;
