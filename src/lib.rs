//! In-memory post collection served as a JSON API over iron.
//!
//! [`store::PostStore`] holds the posts and every rule about them. The
//! [`handlers`] module only translates HTTP requests into store calls.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod store;
