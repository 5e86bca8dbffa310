//! HTTP networking module
//!
//! Thin reqwest wrapper shared by the script loader, the relay service, and
//! the suggestion facade.

mod client;

pub use client::{HttpClient, HttpResponse, DEFAULT_USER_AGENT};
