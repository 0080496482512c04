//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! `session` is the identity model and its rehydration rules; `store` owns a
//! session alongside the remaining storefront flags and drives the actions
//! that change them.

pub mod session;
pub mod store;
