//! Resource model for the Rakuten Web Service API.
//!
//! Each API resource type is declared once with the raw field names the API
//! returns. Fields are then readable through accessors whose names are
//! derived from the wire names (`itemName` on an `Item` reads as `name`,
//! `itemAvailableFlag` also answers `available?`).
//!
//! # Module Structure
//!
//! - [`naming`] - snake_case / camelCase token translation
//! - [`resource`] - resource types, registry, instances and paginated search
//! - [`client`] - transport seam and the HTTP client implementing it
//! - [`config`] - client configuration
//! - [`error`] - crate error type
//!
//! # Example
//!
//! ```ignore
//! use rakuten_ws::{Client, ClientConfig, ResourceRegistry, SearchOptions};
//! use futures::TryStreamExt;
//!
//! async fn cheapest(registry: &ResourceRegistry) -> rakuten_ws::Result<()> {
//!     let client = Client::new(ClientConfig::new("my-app-id"))?;
//!     let items = registry.require("Ichiba::Item")?;
//!     let options = SearchOptions::new().with("keyword", "coffee");
//!     let mut results = rakuten_ws::resource::all(client.into_transport(), items, options);
//!     while let Some(item) = results.try_next().await? {
//!         println!("{:?}", item.read("name")?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod naming;
pub mod resource;

pub use client::{Client, Transport};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use resource::{
    Page, PageInfo, Resource, ResourceRegistry, ResourceType, ResourceTypeBuilder, SearchOptions,
    SearchResult, SortOrder,
};
