//! Networking modules for the storefront REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues authenticated HTTP calls, `config` resolves the service
//! origin and timeouts, and `types` defines the wire schema and the
//! validated login result.

pub mod api;
pub mod config;
pub mod types;
