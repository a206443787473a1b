//! Resource abstraction layer
//!
//! Resource types are declared once, with the raw field names the API
//! returns, and every record of that type then exposes those fields under
//! derived accessor names.
//!
//! # Architecture
//!
//! - [`accessor`] - Derives accessor names from raw attribute names
//! - [`registry`] - Resource types and the registry that records them
//! - [`catalog`] - Built-in Rakuten resource declarations from embedded JSON
//! - [`instance`] - Records of a resource type
//! - [`search`] - Lazy paginated search over a resource type
//!
//! # Example
//!
//! ```ignore
//! use rakuten_ws::resource::{Resource, ResourceRegistry, ResourceType};
//!
//! let mut registry = ResourceRegistry::new();
//! let item = registry.declare(
//!     ResourceType::builder("Item").attributes(["itemName", "itemAvailableFlag"]),
//! )?;
//! let record = Resource::new(item, [("itemName", "Widget")]);
//! assert_eq!(record.read("name")?, Some(&"Widget".into()));
//! assert!(!record.ask("available?")?);
//! ```

pub mod accessor;
pub mod catalog;
mod instance;
mod registry;
mod search;

pub use accessor::{Accessor, AccessorKind, AccessorTable};
pub use instance::Resource;
pub use registry::{
    default_parser, path_parser, ParserFn, Record, ResourceRegistry, ResourceType,
    ResourceTypeBuilder,
};
pub use search::{
    all, all_with, search, Page, PageInfo, SearchOptions, SearchResult, SortOrder, MAX_PAGE,
};
