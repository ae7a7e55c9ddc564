//! # Auth Module
//!
//! Everything that touches the session/auth backend:
//! - `cookies`: the cookie store threaded through one gate evaluation
//! - `client`: the HTTP session client (validate, refresh, identity fetch)
//! - `principal`: the identity + profile join for downstream handlers
//!
//! The session gate in `crate::middleware` consumes this module through
//! the [`client::AuthBackend`] trait.

pub mod client;
pub mod cookies;
pub mod principal;
