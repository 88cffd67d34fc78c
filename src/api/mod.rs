//! # API Module
//!
//! HTTP handlers for the local redirect listener started during the
//! authorization flow.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives Spotify's redirect after the user approved (or
//!   denied) access, validates it and hands the outcome to the waiting flow.
//!
//! The listener serves exactly one successful callback; see
//! [`crate::server::CallbackServer`] for its lifetime.

mod callback;

pub use callback::{CallbackState, callback, callback_outcome};
