//! # Middleware Module
//!
//! Middleware intercepts HTTP requests and responses.
//! Used for cross-cutting concerns like authentication, logging, CORS, etc.
//!
//! ## Our Middleware
//! - `gate`: the session gate (refresh + path-based redirect policy)
//! - `matcher`: decides which paths the gate intercepts at all

pub mod gate;
pub mod matcher;
