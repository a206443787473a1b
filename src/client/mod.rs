//! API transport
//!
//! The resource layer never talks to the network itself. Searches go through
//! the [`Transport`] trait; [`Client`] is the HTTP implementation.
//!
//! # Module Structure
//!
//! - [`transport`] - the transport seam searches are issued through
//! - [`http`] - reqwest-based client for the Rakuten endpoints

pub mod http;
pub mod transport;

pub use http::Client;
pub use transport::{QueryParams, Transport};
