//! Browser implementations of the session crate's IO seams.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` persists the bearer token in `localStorage`; `transport` sends
//! requests with `gloo-net`. Both are no-ops without the `csr` feature.

pub mod storage;
pub mod transport;
