//! Transport-agnostic front door for Burrow.
//!
//! [`Gateway`] wires a shortener and a redirector over one shared store
//! and cache, and dispatches typed [`Request`](burrow_core::api::Request)s
//! to them.

pub mod error;
pub mod gateway;
pub mod settings;

pub use error::GatewayError;
pub use gateway::{Gateway, Reply};
pub use settings::GatewaySettings;
