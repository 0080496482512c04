//! # storefront-client
//!
//! Storefront session client: the authentication/session store, the
//! bearer-token HTTP wrapper, and the durable storage it mirrors into.
//!
//! Pages, routing and cart/product logic live outside this crate and drive
//! the [`state::store::Store`] through its actions and queries.

pub mod net;
pub mod state;
pub mod util;
