//! # Handlers Module
//!
//! HTTP request handlers, all downstream of the session gate:
//! - `health`: liveness endpoint
//! - `pages`: login/signup/dashboard targets, billing config, fallback

pub mod health;
pub mod pages;
